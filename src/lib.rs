// Parley — client engine for the Parley chat backend.
//
// Module map:
//   atoms      — error enum + data model (no I/O)
//   client     — reqwest API surface (/login, /signup, /chat, /upload, …)
//   transcript — append-only message log with an explicit in-progress tag
//   stream     — streaming reply assembler (incremental UTF-8 over chunks)
//   session    — token/profile holder with an injected persistence port
//   recorder   — exclusive start/stop microphone capture + WAV encoding
//   convo      — conversation controller tying transcript and client together
//
// The `parley` binary in main.rs is a thin terminal front end over this.

pub mod atoms;
pub mod client;
pub mod convo;
pub mod recorder;
pub mod session;
pub mod stream;
pub mod transcript;

pub use atoms::error::{ClientError, ClientResult};
