pub mod jsonl_sink;
