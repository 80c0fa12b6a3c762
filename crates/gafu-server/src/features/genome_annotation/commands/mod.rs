pub mod export;
pub mod upload;

pub use export::ExportGenomeCommand;
pub use upload::{InputSource, UploadGenomeCommand};
