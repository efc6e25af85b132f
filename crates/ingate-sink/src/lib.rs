// ingate-sink - concrete delivery sinks
//
// Terminal, file-append and object-store implementations of the sink
// contract. All of them encode batches as newline-delimited JSON; the
// file sink doubles as the reference dead-letter destination.

mod file;
mod ndjson;
mod object_store;
mod terminal;

pub use file::FileSink;
pub use object_store::ObjectStoreSink;
pub use terminal::TerminalSink;
