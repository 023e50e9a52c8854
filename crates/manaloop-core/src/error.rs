//! Error taxonomy for the engine.
//!
//! Two classes of failure exist. *Non-fatal*: a character whose queue cursor
//! has run past the end simply has nothing to do ([`Error::NoAction`] is only
//! produced by the strict single-character accessor; the batch resolver and
//! the scheduler treat that character as idle). *Fatal*: an unresolvable
//! action reference or a target with no defined cost aborts the whole
//! scheduler call and unwinds to the caller. The path projector catches
//! everything and truncates instead of propagating.

use thiserror::Error;

use crate::action::ActionScope;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while resolving or advancing the world.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The character's queue cursor has nothing left. Non-fatal: batch
    /// callers treat this as "idle", never as an abort.
    #[error("character `{character}` has no queued action left")]
    NoAction {
        /// Name of the idle character.
        character: String,
    },

    /// A queued action reference does not resolve in the relevant definition
    /// table. Fatal: aborts the current scheduler call.
    #[error("action {id} not found in the {scope} action table for character `{character}`")]
    ActionNotFound {
        /// Name of the character whose queue holds the dangling reference.
        character: String,
        /// The unresolvable action id.
        id: u32,
        /// Which table the reference pointed at.
        scope: ActionScope,
    },

    /// No layer (instance, character, or world) defines a cost for the
    /// action type on the resolved target. Fatal.
    #[error("no cost defined for `{kind}` on `{target}` at ({x}, {y}) for character `{character}`")]
    NoCost {
        /// Name of the acting character.
        character: String,
        /// Display form of the action kind.
        kind: String,
        /// Name of the primary target the layers were consulted for.
        target: String,
        /// Target cell column.
        x: i32,
        /// Target cell row.
        y: i32,
    },

    /// The resolved cost is infinite: the action is currently impossible and
    /// must never be spent against. Raised only by the strict accessor; the
    /// scheduler excludes such characters from the lockstep minimum instead.
    #[error("cost for `{kind}` on `{target}` at ({x}, {y}) is not finite")]
    InfiniteCost {
        /// Display form of the action kind.
        kind: String,
        /// Name of the gated target.
        target: String,
        /// Target cell column.
        x: i32,
        /// Target cell row.
        y: i32,
    },

    /// A completed movement action points outside the map. Fatal, position
    /// unchanged.
    #[error("move from ({from_x}, {from_y}) by ({dx}, {dy}) leaves the map")]
    MoveOutOfBounds {
        /// Column moved from.
        from_x: i32,
        /// Row moved from.
        from_y: i32,
        /// Attempted column delta.
        dx: i32,
        /// Attempted row delta.
        dy: i32,
    },

    /// A completed movement action points at a blocked cell. Fatal, position
    /// unchanged.
    #[error("destination ({x}, {y}) is blocked")]
    DestinationBlocked {
        /// Destination column.
        x: i32,
        /// Destination row.
        y: i32,
    },

    /// A tile instance references a definition id missing from the world's
    /// definition table. Always a world-construction bug.
    #[error("tile definition {id} is not registered")]
    UnknownTileDefinition {
        /// The dangling definition id.
        id: u32,
    },

    /// A permanent-state snapshot does not line up with the current world's
    /// shape (grid dimensions, instance counts, or character count).
    #[error("permanent-state snapshot does not match this world: {reason}")]
    SnapshotMismatch {
        /// Human-readable description of the first mismatch found.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_character_and_action() {
        let err = Error::ActionNotFound {
            character: "Wanderer".into(),
            id: 7,
            scope: ActionScope::Global,
        };
        let text = err.to_string();
        assert!(text.contains("Wanderer"));
        assert!(text.contains('7'));
        assert!(text.contains("global"));
    }

    #[test]
    fn no_cost_reports_target_and_position() {
        let err = Error::NoCost {
            character: "Wanderer".into(),
            kind: "speak".into(),
            target: "Rock".into(),
            x: 3,
            y: 1,
        };
        let text = err.to_string();
        assert!(text.contains("Rock"));
        assert!(text.contains("(3, 1)"));
    }
}
