mod jsonl;
mod text;

pub use jsonl::JsonlRenderer;
pub use text::TextRenderer;
