//! 연결 워커
//!
//! 디코딩된 요청을 큐에 받아 상태 머신을 블로킹 스레드에서 실행하고,
//! 응답을 `tokio-stream` 스트림으로 내보냅니다.
//!
//! RESET은 큐에 들어가는 즉시 인터럽트를 걸기 때문에, 그보다 앞에
//! 대기 중인 요청은 IGNORED로 응답됩니다.

use std::io;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::bolt::error::{BoltError, BoltResult, Status};
use crate::bolt::message::{
    BoltRequest, BoltResponse, FailureMessage, RecordMessage, SuccessMessage,
};
use crate::bolt::value::BoltValue;
use crate::fsm::{BoltStateMachine, MachineHandle, ResponseHandler};

/// 응답 채널 크기
const RESPONSE_BUFFER: usize = 1024;

/// 응답 스트림
pub type ResponseStream = ReceiverStream<BoltResponse>;

// ============================================================================
// ChannelSink - 응답 전송
// ============================================================================

/// 블로킹 스레드에서 응답 채널로 보내는 핸들러
struct ChannelSink {
    responses: mpsc::Sender<BoltResponse>,
}

impl ChannelSink {
    fn send(&self, response: BoltResponse) -> BoltResult<()> {
        self.responses.blocking_send(response).map_err(|_| {
            BoltError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "response stream closed",
            ))
        })
    }
}

impl ResponseHandler for ChannelSink {
    fn on_record(&mut self, fields: Vec<BoltValue>) -> BoltResult<()> {
        self.send(BoltResponse::Record(RecordMessage::new(fields)))
    }

    fn on_success(&mut self, success: SuccessMessage) -> BoltResult<()> {
        self.send(BoltResponse::Success(success))
    }

    fn on_failure(&mut self, failure: FailureMessage) -> BoltResult<()> {
        self.send(BoltResponse::Failure(failure))
    }

    fn on_ignored(&mut self) -> BoltResult<()> {
        self.send(BoltResponse::Ignored)
    }
}

// ============================================================================
// BoltConnection - 연결 워커
// ============================================================================

/// 연결 워커
///
/// 상태 머신 하나를 소유하고 요청을 FIFO 순서로 처리합니다.
///
/// # 예시
///
/// ```rust,ignore
/// let (connection, mut responses) = BoltConnection::spawn(machine);
/// connection.enqueue(BoltRequest::Hello(HelloMessage::new("app/1.0")))?;
/// while let Some(response) = responses.next().await {
///     println!("{}", response.name());
/// }
/// ```
pub struct BoltConnection {
    handle: MachineHandle,
    requests: Option<mpsc::Sender<BoltRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl BoltConnection {
    /// 워커 시작
    ///
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn spawn(machine: BoltStateMachine) -> (Self, ResponseStream) {
        let handle = machine.handle();
        let (request_tx, request_rx) = mpsc::channel(machine.config().max_queued_messages.max(1));
        let (response_tx, response_rx) = mpsc::channel(RESPONSE_BUFFER);

        let wake = Arc::new(Notify::new());
        let waker = Arc::clone(&wake);
        handle.signals().set_waker(move || waker.notify_one());

        debug!("{}: worker started", handle.connection_id());
        let worker = tokio::spawn(worker_loop(machine, request_rx, response_tx, wake));

        let connection = Self {
            handle,
            requests: Some(request_tx),
            worker: Some(worker),
        };
        (connection, ReceiverStream::new(response_rx))
    }

    /// 연결 ID
    pub fn connection_id(&self) -> &str {
        self.handle.connection_id()
    }

    /// 상태 머신 제어 핸들
    pub fn handle(&self) -> &MachineHandle {
        &self.handle
    }

    /// 요청을 큐에 넣기 (대기 없음)
    ///
    /// 큐가 가득 차면 요청을 버리고 `Request.NoThreadsAvailable` 실패를
    /// 다음에 처리되는 요청의 응답으로 예약합니다.
    pub fn enqueue(&self, request: BoltRequest) -> BoltResult<()> {
        match self.sender()?.try_reserve() {
            Ok(permit) => {
                self.call_ahead(&request);
                permit.send(request);
                Ok(())
            }
            Err(TrySendError::Full(())) => {
                let error = BoltError::status(
                    Status::RequestNoThreadsAvailable,
                    format!(
                        "Unable to schedule {}: the inbound queue is full.",
                        request.name()
                    ),
                );
                warn!("{}: {}", self.connection_id(), error);
                self.handle.mark_failed(&error);
                Err(error)
            }
            Err(TrySendError::Closed(())) => Err(BoltError::ConnectionClosed),
        }
    }

    /// 요청을 큐에 넣기 (공간이 생길 때까지 대기)
    pub async fn send(&self, request: BoltRequest) -> BoltResult<()> {
        let permit = self
            .sender()?
            .reserve()
            .await
            .map_err(|_| BoltError::ConnectionClosed)?;
        self.call_ahead(&request);
        permit.send(request);
        Ok(())
    }

    /// 인터럽트 요청
    pub fn interrupt(&self) {
        self.handle.interrupt();
    }

    /// 종료 요청
    ///
    /// 유휴 상태의 워커도 즉시 깨어나 연결을 닫습니다.
    pub fn terminate(&self) {
        self.handle.terminate();
    }

    /// 큐를 닫고 남은 요청을 처리한 뒤 워커 종료를 기다림
    pub async fn close(mut self) -> BoltResult<()> {
        self.requests = None;
        match self.worker.take() {
            Some(worker) => worker
                .await
                .map_err(|e| BoltError::Io(io::Error::new(io::ErrorKind::Other, e.to_string()))),
            None => Ok(()),
        }
    }

    fn sender(&self) -> BoltResult<&mpsc::Sender<BoltRequest>> {
        self.requests.as_ref().ok_or(BoltError::ConnectionClosed)
    }

    /// RESET은 자리를 확보한 뒤, 큐에 들어가기 전에 인터럽트를 겁니다.
    fn call_ahead(&self, request: &BoltRequest) {
        if request.is_reset() {
            self.handle.interrupt();
        }
    }
}

impl std::fmt::Debug for BoltConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoltConnection")
            .field("handle", &self.handle)
            .field("open", &self.requests.is_some())
            .finish()
    }
}

/// 워커 루프
async fn worker_loop(
    mut machine: BoltStateMachine,
    mut requests: mpsc::Receiver<BoltRequest>,
    responses: mpsc::Sender<BoltResponse>,
    wake: Arc<Notify>,
) {
    let id = machine.connection_id().to_string();

    loop {
        let request = tokio::select! {
            biased;
            _ = wake.notified() => {
                if machine.validate_termination() {
                    break;
                }
                continue;
            }
            request = requests.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };

        let mut sink = ChannelSink {
            responses: responses.clone(),
        };
        let processed = tokio::task::spawn_blocking(move || {
            let result = machine.process(request, &mut sink);
            (machine, result)
        })
        .await;

        let (returned, result) = match processed {
            Ok(processed) => processed,
            Err(e) => {
                warn!("{}: request processing panicked: {}", id, e);
                return;
            }
        };
        machine = returned;

        match result {
            Ok(()) if machine.is_closed() => break,
            Ok(()) => {}
            Err(BoltError::ConnectionClosed) => break,
            Err(e) => {
                warn!("{}: closing after I/O error: {}", id, e);
                break;
            }
        }
    }

    drop(requests);
    machine.close();
    debug!("{}: worker stopped", id);
}
