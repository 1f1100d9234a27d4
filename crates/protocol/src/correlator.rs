//! Command Correlator: every command leaves the client with exactly one
//! [`CommandId`].

use crate::{Command, CommandId};

/// Assigns a freshly generated identifier to `command` if it has none and
/// returns the identifier it carries afterwards.
///
/// An existing identifier is never replaced.
pub fn ensure_id(command: &mut Command) -> &CommandId {
    command.id_or_insert_with(CommandId::generate)
}
