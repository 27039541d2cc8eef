pub mod realizer;

pub use realizer::TemplateRealizer;
