/// Where the current turn is. `Completed` and `Failed` are recorded as the
/// last outcome; the session itself always returns to `Idle`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::Display)]
pub enum TurnState {
    #[default]
    Idle,
    Sent,
    Streaming,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
pub enum TurnOutcome {
    Completed,
    Failed,
}
