pub mod download;
pub mod status;

pub use download::{DownloadGenbankQuery, DownloadedGenbank};
