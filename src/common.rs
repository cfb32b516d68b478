pub mod clock;
pub mod db_utils;
pub mod documento;
pub mod error;
pub mod i18n;
pub mod notifier;
