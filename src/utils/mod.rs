mod io_utils;
mod readers;
mod sample_kind;
mod threads;
mod util;

pub use io_utils::{create_writer, open_report_file};
pub use readers::open_text_reader;
pub use sample_kind::SampleKind;
pub use threads::initialize_thread_pool;
pub use util::{handle_error_and_exit, plural, wrap_names, Result};
