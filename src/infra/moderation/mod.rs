pub mod akismet_client;
pub mod content_record;
pub mod site;

pub use akismet_client::AkismetClient;
pub use content_record::ContentRecord;
pub use site::ConfiguredSite;
