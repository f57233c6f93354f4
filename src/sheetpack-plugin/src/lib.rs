//! Out-of-process content packs.
//!
//! This crate provides:
//! - A JSON-lines protocol for talking to pack processes
//! - [`serve`], the loop a pack process runs over its stdin/stdout
//! - An exec-based host that spawns and drives a pack process
//! - [`ExecPluginPack`], which exposes a running plugin as a [`ContentSource`]
//!
//! # Plugin Protocol
//!
//! The host writes one [`PluginRequest`] per line to the plugin's stdin and
//! reads one [`PluginResponse`] per line from its stdout:
//!
//! ```text
//! -> {"id":1,"method":{"type":"Initialize"}}
//! <- {"id":1,"result":{"status":"Initialized","id":"srd","name":"SRD","version":"1.0.0","protocol_version":1}}
//! -> {"id":2,"method":{"type":"Call","params":{"method":"info","arg":"info/druid"}}}
//! <- {"id":2,"result":{"status":"Envelope","entry":{"key":"info","value":{"type":"bytes","data":"<base64>"}}}}
//! -> {"id":3,"method":{"type":"Shutdown"}}
//! <- {"id":3,"result":{"status":"ShutdownAck"}}
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use sheetpack_plugin::{ExecPluginPack, PluginConfig};
//! use sheetpack_core::ContentSource;
//!
//! let pack = ExecPluginPack::new(PluginConfig::new("/path/to/pack-plugin"))?;
//! let envelope = pack.call("spells", None);
//! ```
//!
//! [`ContentSource`]: sheetpack_core::ContentSource

mod adapter;
mod host;
pub mod protocol;
mod serve;

pub use adapter::ExecPluginPack;
pub use host::{ExecPluginHost, PluginConfig, PluginHostError};
pub use protocol::{
    PluginError, PluginErrorKind, PluginInfo, PluginMethod, PluginRequest, PluginResponse,
    PluginResult, PROTOCOL_VERSION,
};
pub use serve::serve;
