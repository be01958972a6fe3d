//! 세션 설정
//!
//! Bolt 세션 상태 머신과 연결 워커가 공유하는 설정입니다.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 기본 서버 에이전트
pub const DEFAULT_SERVER_AGENT: &str = "Zeta4G/1.17.0";

/// 기본 데이터베이스
pub const DEFAULT_DATABASE: &str = "zeta4g";

/// 기본 수신 큐 크기
pub const DEFAULT_MAX_QUEUED_MESSAGES: usize = 128;

// ============================================================================
// SessionConfig - 세션 설정
// ============================================================================

/// 세션 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// HELLO SUCCESS의 `server` 값
    pub server_agent: String,
    /// BEGIN/RUN에 `db`가 없을 때 사용할 데이터베이스
    pub default_database: String,
    /// 클라이언트에 힌트로 알려줄 수신 타임아웃 (초)
    pub connection_recv_timeout: Option<u64>,
    /// 자격 증명 만료 상태에서도 실행 가능한 쿼리 접두사
    pub credentials_expired_allowlist: Vec<String>,
    /// 연결당 수신 큐 크기
    pub max_queued_messages: usize,
}

impl SessionConfig {
    /// 새 설정 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 빌더 시작
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    /// 수신 타임아웃 힌트
    pub fn recv_timeout(&self) -> Option<Duration> {
        self.connection_recv_timeout.map(Duration::from_secs)
    }

    /// 자격 증명 만료 상태에서 허용되는 쿼리인지 확인
    ///
    /// 앞뒤 공백과 대소문자를 무시하고 접두사를 비교합니다.
    pub fn is_allowed_when_expired(&self, query: &str) -> bool {
        let query = query.trim().to_uppercase();
        self.credentials_expired_allowlist
            .iter()
            .any(|prefix| query.starts_with(&prefix.trim().to_uppercase()))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_agent: DEFAULT_SERVER_AGENT.to_string(),
            default_database: DEFAULT_DATABASE.to_string(),
            connection_recv_timeout: None,
            credentials_expired_allowlist: vec![
                "ALTER CURRENT USER SET PASSWORD".to_string(),
                "CALL dbms.security.changePassword".to_string(),
                "SHOW CURRENT USER".to_string(),
            ],
            max_queued_messages: DEFAULT_MAX_QUEUED_MESSAGES,
        }
    }
}

// ============================================================================
// SessionConfigBuilder - 세션 설정 빌더
// ============================================================================

/// 세션 설정 빌더
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// 새 빌더 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 서버 에이전트 설정
    pub fn with_server_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.server_agent = agent.into();
        self
    }

    /// 기본 데이터베이스 설정
    pub fn with_default_database(mut self, database: impl Into<String>) -> Self {
        self.config.default_database = database.into();
        self
    }

    /// 수신 타임아웃 힌트 설정
    pub fn with_connection_recv_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_recv_timeout = Some(timeout.as_secs());
        self
    }

    /// 허용 쿼리 접두사 추가
    pub fn with_allowed_when_expired(mut self, prefix: impl Into<String>) -> Self {
        self.config.credentials_expired_allowlist.push(prefix.into());
        self
    }

    /// 수신 큐 크기 설정 (최소 1)
    pub fn with_max_queued_messages(mut self, size: usize) -> Self {
        self.config.max_queued_messages = size.max(1);
        self
    }

    /// 빌드
    pub fn build(self) -> SessionConfig {
        self.config
    }
}
