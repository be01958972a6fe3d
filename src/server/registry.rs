//! 연결 레지스트리
//!
//! 인증된 Bolt 연결을 연결 ID와 소유자(principal) 기준으로 추적합니다.
//! 관리 스레드는 레지스트리를 통해 연결을 인터럽트하거나 종료합니다.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::fsm::{MachineHandle, SessionObserver};

// ============================================================================
// ConnectionRegistry - 연결 레지스트리
// ============================================================================

#[derive(Debug)]
struct Registered {
    handle: MachineHandle,
    owner: Option<String>,
}

/// 연결 레지스트리
///
/// [`SessionObserver`]로 상태 머신에 연결하면 인증 시 등록되고,
/// 연결이 닫히면 제거됩니다.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, Registered>>,
}

impl ConnectionRegistry {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 연결 종료 요청
    ///
    /// 등록된 연결이면 `true`를 반환합니다.
    pub fn terminate(&self, connection_id: &str) -> bool {
        match self.find(connection_id) {
            Some(handle) => {
                handle.terminate();
                true
            }
            None => false,
        }
    }

    /// 소유자의 모든 연결 종료 요청
    ///
    /// 종료를 요청한 연결 수를 반환합니다.
    pub fn terminate_owner(&self, owner: &str) -> usize {
        let handles: Vec<MachineHandle> = self
            .connections
            .read()
            .values()
            .filter(|c| c.owner.as_deref() == Some(owner))
            .map(|c| c.handle.clone())
            .collect();

        debug!("terminating {} connections of '{}'", handles.len(), owner);
        for handle in &handles {
            handle.terminate();
        }
        handles.len()
    }

    /// 연결 인터럽트 요청
    pub fn interrupt(&self, connection_id: &str) -> bool {
        match self.find(connection_id) {
            Some(handle) => {
                handle.interrupt();
                true
            }
            None => false,
        }
    }

    /// 등록된 연결 ID 목록 (정렬됨)
    pub fn connection_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.connections.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// 소유자의 연결 ID 목록 (정렬됨)
    pub fn owned_by(&self, owner: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .connections
            .read()
            .iter()
            .filter(|(_, c)| c.owner.as_deref() == Some(owner))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// 연결의 소유자
    pub fn owner_of(&self, connection_id: &str) -> Option<String> {
        self.connections
            .read()
            .get(connection_id)
            .and_then(|c| c.owner.clone())
    }

    /// 등록된 연결 수
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// 비어 있는지 확인
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    fn find(&self, connection_id: &str) -> Option<MachineHandle> {
        self.connections
            .read()
            .get(connection_id)
            .map(|c| c.handle.clone())
    }
}

impl SessionObserver for ConnectionRegistry {
    fn on_authenticated(&self, principal: &str, handle: MachineHandle) {
        let id = handle.connection_id().to_string();
        debug!("{}: registered for '{}'", id, principal);
        self.connections.write().insert(
            id,
            Registered {
                handle,
                owner: Some(principal.to_string()),
            },
        );
    }

    fn on_logged_off(&self, connection_id: &str) {
        if let Some(entry) = self.connections.write().get_mut(connection_id) {
            entry.owner = None;
        }
    }

    fn on_closed(&self, connection_id: &str) {
        if self.connections.write().remove(connection_id).is_some() {
            debug!("{}: deregistered", connection_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::bolt::version::BoltVersion;
    use crate::fsm::testkit::Harness;

    fn handle() -> MachineHandle {
        Harness::new(BoltVersion::V5_4).machine.handle()
    }

    #[test]
    fn test_register_on_authentication() {
        let registry = ConnectionRegistry::new();
        let a = handle();
        let b = handle();
        registry.on_authenticated("neo4j", a.clone());
        registry.on_authenticated("alice", b.clone());

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.owner_of(a.connection_id()), Some("neo4j".to_string()));
        assert_eq!(registry.owned_by("alice"), vec![b.connection_id().to_string()]);
    }

    #[test]
    fn test_logoff_clears_owner() {
        let registry = ConnectionRegistry::new();
        let a = handle();
        registry.on_authenticated("neo4j", a.clone());
        registry.on_logged_off(a.connection_id());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.owner_of(a.connection_id()), None);
        assert!(registry.owned_by("neo4j").is_empty());

        registry.on_authenticated("alice", a.clone());
        assert_eq!(registry.owner_of(a.connection_id()), Some("alice".to_string()));
    }

    #[test]
    fn test_terminate_owner() {
        let registry = ConnectionRegistry::new();
        let handles: Vec<MachineHandle> = (0..3).map(|_| handle()).collect();
        registry.on_authenticated("neo4j", handles[0].clone());
        registry.on_authenticated("neo4j", handles[1].clone());
        registry.on_authenticated("alice", handles[2].clone());

        assert_eq!(registry.terminate_owner("neo4j"), 2);
        assert!(handles[0].is_terminated());
        assert!(handles[1].is_terminated());
        assert!(!handles[2].is_terminated());
        assert_eq!(registry.terminate_owner("nobody"), 0);
    }

    #[test]
    fn test_terminate_and_interrupt_by_id() {
        let registry = ConnectionRegistry::new();
        let a = handle();
        registry.on_authenticated("neo4j", a.clone());

        assert!(registry.interrupt(a.connection_id()));
        assert_eq!(a.pending_interrupts(), 1);
        assert!(registry.terminate(a.connection_id()));
        assert!(a.is_terminated());
        assert!(!registry.terminate("bolt-unknown"));
    }

    #[test]
    fn test_machine_registers_and_deregisters() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut h = Harness::new(BoltVersion::V5_4).observed(registry.clone());
        let id = h.machine.connection_id().to_string();
        assert!(registry.is_empty());

        h.authenticate("neo4j", "password");
        assert_eq!(registry.connection_ids(), vec![id.clone()]);

        assert!(registry.terminate(&id));
        assert!(h.machine.validate_termination());
        assert!(registry.is_empty());
    }
}
