//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter           | Implements   | Connects to                     |
//! |-------------------|--------------|---------------------------------|
//! | `config_file`     | ConfigPort   | JSON file on disk               |
//! | `line_reader`     | CardReader   | keyboard-wedge / serial lines   |
//! | `log_sink`        | EventSink    | `log` facade                    |
//! | `sqlite_ledger`   | ScanLedger   | SQLite database file            |
//! | `threaded_reader` | CardReader   | any reader, on a worker thread  |
//! | `time`            | Clock        | system clock / manual clock     |

pub mod config_file;
pub mod line_reader;
pub mod log_sink;
pub mod sqlite_ledger;
pub mod threaded_reader;
pub mod time;
