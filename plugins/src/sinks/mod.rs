mod jsonl;

pub use jsonl::JsonlReportSink;
