//! 서버 측 연결 관리
//!
//! - [`BoltConnection`]: 상태 머신을 구동하는 연결별 워커
//! - [`ConnectionRegistry`]: 인증된 연결 추적 및 관리용 종료

mod connection;
mod registry;

pub use connection::{BoltConnection, ResponseStream};
pub use registry::ConnectionRegistry;
