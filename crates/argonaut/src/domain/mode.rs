/// The single active UI modality.
///
/// Exactly one mode is active at a time; transitions go through
/// [`crate::app::Model::enter_mode`] so leaving a modal always clears its
/// scratch state.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Mode {
    #[default]
    Normal,
    Search,
    Command,
    Help,
    ConfirmSync,
    Rollback,
    ConfirmAppDelete,
    Diff,
    NoDiff,
    Loading,
    AuthRequired,
    ConnectionError,
    Error,
    UpgradeConfirm,
    UpgradeError,
    UpgradeSuccess,
    Theme,
    CoreDetected,
}

