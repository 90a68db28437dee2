// Certificates module - Chain extraction and certificate records

pub mod extractor;
pub mod record;

pub use extractor::ChainExtractor;
pub use record::CertificateRecord;
