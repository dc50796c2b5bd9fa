pub mod l10n;
pub mod metrics;
pub mod navigation;
pub mod redirect_validator;
pub mod storage;
pub mod web_channel;
