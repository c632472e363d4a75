//! Client-side stroke pipeline for a collaborative whiteboard.
//!
//! Every participant of a room runs one [`client::RoomClient`]. Pointer input is
//! normalized per device, turned into strokes styled by a tool × device table,
//! and published to a shared store: a new stroke is written the moment it
//! starts, its growth at a bounded rate. Each client subscribes to the room's
//! strokes, replaces its local collection on every delivery, and renders only
//! what the camera can see. Undo and redo walk a shared timeline but only ever
//! write the acting user's own strokes.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`client`] | Room host: engine plus publisher plus listener |
//! | [`engine`] | Store-agnostic [`engine::EngineCore`] and its [`engine::Action`]s |
//! | [`input`] | Pointer samples, device classification, shortcuts |
//! | [`profile`] | Tool and device profile table, stroke style builder |
//! | [`capture`] | Gesture state machine producing strokes and growth |
//! | [`stroke`] | Stroke records, keys and the room collection |
//! | [`sync`] | Store seam, writer task, publisher, merge listener |
//! | [`rate_limit`] | Fixed-interval write coalescer |
//! | [`history`] | Ownership-scoped undo/redo timeline |
//! | [`render`] | Viewport culling |
//! | [`hit`] | Rectangle selection |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`config`] | Environment configuration |
//! | [`error`] | Error codes shared by every error type |
//! | [`consts`] | Defaults and tuning constants |

pub mod camera;
pub mod capture;
pub mod client;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod history;
pub mod hit;
pub mod input;
pub mod profile;
pub mod rate_limit;
pub mod render;
pub mod stroke;
pub mod sync;
