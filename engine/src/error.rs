use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("participant '{0}' not found")]
    ParticipantNotFound(String),
    #[error("participant '{0}' is already in the combat")]
    DuplicateParticipant(String),
    #[error("no combat is active")]
    CombatInactive,
    #[error("invalid dice expression '{0}'")]
    InvalidDice(String),
    #[error("unknown difficulty '{0}' (expected easy, medium, hard or deadly)")]
    InvalidDifficulty(String),
    #[error("unknown damage type '{0}'")]
    UnknownDamageType(String),
    #[error("unknown action '{0}' (expected action, bonus_action, reaction or movement)")]
    UnknownAction(String),
    #[error("unknown milestone '{0}' (expected minor, major or story)")]
    UnknownMilestone(String),
    #[error("monster '{0}' not found in catalog")]
    UnknownMonster(String),
    #[error("catalog error: {0}")]
    Catalog(String),
    #[error("invalid combat snapshot: {0}")]
    Snapshot(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
