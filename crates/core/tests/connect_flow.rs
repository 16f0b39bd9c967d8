// Connect flow integration tests
//
// Drives LinkSessionController against in-memory backends, widgets, and
// script hosts.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use futures_util::future::{self, BoxFuture, FutureExt};
use hrlink::error::{TOKEN_REQUEST_FALLBACK, WIDGET_ERROR_FALLBACK, WIDGET_UNAVAILABLE_MESSAGE};
use hrlink::{
	BackendError, CapabilityProvider, Category, ConnectRequest, GlobalScope, LinkBackend, LinkConfig,
	LinkSession, LinkSessionController, LinkWidget, ScriptHost, ScriptLoader, ScriptSource, SessionStatus,
	WidgetConfig, WidgetError, WidgetProvider,
};
use hrlink_protocol::{ExchangeTokenRequest, LinkTokenRequest};
use hrlink_runtime::{ScriptEvent, ScriptTag};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::{Notify, watch};

const GLOBAL: &str = "MergeLink";
const SCRIPT_URL: &str = "https://cdn.merge.dev/initialize.js";

struct MockBackend {
	link_token: Mutex<Result<String, BackendError>>,
	exchange: Mutex<Result<Value, BackendError>>,
	/// When set, `create_link_token` waits for a notification before answering.
	hold_token: Option<Arc<Notify>>,
	token_requests: Mutex<Vec<LinkTokenRequest>>,
	exchange_requests: Mutex<Vec<ExchangeTokenRequest>>,
}

impl MockBackend {
	fn new() -> Self {
		Self {
			link_token: Mutex::new(Ok("tok_abc123".into())),
			exchange: Mutex::new(Ok(json!({"company": "Acme"}))),
			hold_token: None,
			token_requests: Mutex::new(Vec::new()),
			exchange_requests: Mutex::new(Vec::new()),
		}
	}

	fn held(gate: Arc<Notify>) -> Self {
		Self {
			hold_token: Some(gate),
			..Self::new()
		}
	}

	fn calls(&self) -> (usize, usize) {
		(self.token_requests.lock().len(), self.exchange_requests.lock().len())
	}
}

#[async_trait]
impl LinkBackend for MockBackend {
	async fn create_link_token(&self, request: &LinkTokenRequest) -> Result<String, BackendError> {
		self.token_requests.lock().push(request.clone());
		if let Some(gate) = &self.hold_token {
			gate.notified().await;
		}
		self.link_token.lock().clone()
	}

	async fn exchange_token(&self, request: &ExchangeTokenRequest) -> Result<Value, BackendError> {
		self.exchange_requests.lock().push(request.clone());
		self.exchange.lock().clone()
	}
}

#[derive(Clone)]
enum Reply {
	Success(&'static str),
	Exit,
	Error(Option<&'static str>),
}

/// Widget that answers synchronously when opened.
struct MockWidget {
	reply: Mutex<Reply>,
	config: Mutex<Option<WidgetConfig>>,
	link_tokens: Mutex<Vec<String>>,
}

impl MockWidget {
	fn new(reply: Reply) -> Arc<Self> {
		Arc::new(Self {
			reply: Mutex::new(reply),
			config: Mutex::new(None),
			link_tokens: Mutex::new(Vec::new()),
		})
	}

	fn opened(&self) -> usize {
		self.link_tokens.lock().len()
	}
}

impl LinkWidget for MockWidget {
	fn initialize(&self, config: WidgetConfig) {
		self.link_tokens.lock().push(config.link_token.clone());
		*self.config.lock() = Some(config);
	}

	fn open_link(&self) {
		let Some(config) = self.config.lock().clone() else {
			return;
		};
		match self.reply.lock().clone() {
			Reply::Success(token) => config.callbacks.success(token),
			Reply::Exit => config.callbacks.exit(),
			Reply::Error(Some(message)) => config.callbacks.error(WidgetError::new(message)),
			Reply::Error(None) => config.callbacks.error(WidgetError::default()),
		}
	}
}

type Scope = GlobalScope<Arc<dyn LinkWidget>>;

struct Fixture {
	controller: Arc<LinkSessionController>,
	backend: Arc<MockBackend>,
	scope: Arc<Scope>,
}

fn fixture(backend: MockBackend, widget: Option<Arc<MockWidget>>) -> Fixture {
	let scope: Arc<Scope> = Arc::new(GlobalScope::new());
	if let Some(widget) = widget {
		scope.define(GLOBAL, widget as Arc<dyn LinkWidget>);
	}
	let backend = Arc::new(backend);
	let widgets: Arc<WidgetProvider> = scope.clone();
	let controller = LinkSessionController::new(backend.clone(), widgets, LinkConfig::default());
	Fixture {
		controller: Arc::new(controller),
		backend,
		scope,
	}
}

fn request() -> ConnectRequest {
	ConnectRequest {
		end_user_id: "test-user-123".into(),
		organization_name: "Test Organization".into(),
		email: "test@example.com".into(),
		categories: Category::ALL.to_vec(),
		organization_id: "test-org-123".into(),
	}
}

#[tokio::test]
async fn missing_widget_fails_without_backend_calls() {
	let fx = fixture(MockBackend::new(), None);

	let session = fx.controller.connect(&request()).await;

	assert_eq!(session.status, SessionStatus::Failed);
	assert_eq!(session.error_message.as_deref(), Some(WIDGET_UNAVAILABLE_MESSAGE));
	assert_eq!(fx.backend.calls(), (0, 0));
}

#[tokio::test]
async fn successful_connect_stores_payload_verbatim() {
	let widget = MockWidget::new(Reply::Success("pub_xyz789"));
	let fx = fixture(MockBackend::new(), Some(widget.clone()));

	let session = fx.controller.connect(&request()).await;

	assert_eq!(session.status, SessionStatus::Succeeded);
	assert_eq!(session.result_payload, Some(json!({"company": "Acme"})));
	assert!(session.error_message.is_none());

	let token_requests = fx.backend.token_requests.lock();
	assert_eq!(token_requests[0].end_user_origin_id, "test-user-123");
	assert_eq!(token_requests[0].end_user_organization_name, "Test Organization");
	assert_eq!(token_requests[0].end_user_email_address, "test@example.com");
	assert_eq!(token_requests[0].categories, Category::ALL.to_vec());

	assert_eq!(*widget.link_tokens.lock(), vec!["tok_abc123".to_string()]);

	let exchange_requests = fx.backend.exchange_requests.lock();
	assert_eq!(
		exchange_requests[0],
		ExchangeTokenRequest {
			public_token: "pub_xyz789".into(),
			user_id: "test-user-123".into(),
			organization_id: "test-org-123".into(),
		}
	);
}

/// Backend and widget in one that records the session status whenever the
/// controller calls into it.
#[derive(Default)]
struct StageRecorder {
	session: OnceLock<watch::Receiver<LinkSession>>,
	config: Mutex<Option<WidgetConfig>>,
	stages: Mutex<Vec<SessionStatus>>,
}

impl StageRecorder {
	fn record(&self) {
		if let Some(rx) = self.session.get() {
			let status = rx.borrow().status;
			self.stages.lock().push(status);
		}
	}
}

#[async_trait]
impl LinkBackend for StageRecorder {
	async fn create_link_token(&self, _request: &LinkTokenRequest) -> Result<String, BackendError> {
		self.record();
		Ok("tok_abc123".into())
	}

	async fn exchange_token(&self, _request: &ExchangeTokenRequest) -> Result<Value, BackendError> {
		self.record();
		Ok(json!({"company": "Acme"}))
	}
}

impl LinkWidget for StageRecorder {
	fn initialize(&self, config: WidgetConfig) {
		*self.config.lock() = Some(config);
	}

	fn open_link(&self) {
		self.record();
		if let Some(config) = self.config.lock().clone() {
			config.callbacks.success("pub_xyz789");
		}
	}
}

#[tokio::test]
async fn session_passes_through_each_stage_in_order() {
	let recorder = Arc::new(StageRecorder::default());
	let scope: Arc<Scope> = Arc::new(GlobalScope::new());
	scope.define(GLOBAL, recorder.clone() as Arc<dyn LinkWidget>);
	let widgets: Arc<WidgetProvider> = scope;
	let controller = LinkSessionController::new(recorder.clone(), widgets, LinkConfig::default());
	assert!(recorder.session.set(controller.subscribe()).is_ok());

	let session = controller.connect(&request()).await;

	let mut stages = recorder.stages.lock().clone();
	stages.push(session.status);
	assert_eq!(
		stages,
		vec![
			SessionStatus::RequestingToken,
			SessionStatus::WidgetOpen,
			SessionStatus::Exchanging,
			SessionStatus::Succeeded,
		]
	);
}

#[tokio::test]
async fn exchange_detail_is_shown_verbatim() {
	let backend = MockBackend::new();
	*backend.exchange.lock() = Err(BackendError::Status {
		status: 400,
		detail: Some("bad token".into()),
	});
	let fx = fixture(backend, Some(MockWidget::new(Reply::Success("pub_xyz789"))));

	let session = fx.controller.connect(&request()).await;

	assert_eq!(session.status, SessionStatus::Failed);
	assert_eq!(session.error_message.as_deref(), Some("bad token"));
	assert!(session.result_payload.is_none());
}

#[tokio::test]
async fn token_request_failure_uses_fallback_without_opening_widget() {
	let backend = MockBackend::new();
	*backend.link_token.lock() = Err(BackendError::Transport {
		url: "http://localhost:8000/create-link-token".into(),
		message: "connection refused".into(),
	});
	let widget = MockWidget::new(Reply::Success("pub_xyz789"));
	let fx = fixture(backend, Some(widget.clone()));

	let session = fx.controller.connect(&request()).await;

	assert_eq!(session.status, SessionStatus::Failed);
	assert_eq!(session.error_message.as_deref(), Some(TOKEN_REQUEST_FALLBACK));
	assert_eq!(widget.opened(), 0);
	assert_eq!(fx.backend.calls(), (1, 0));
}

#[tokio::test]
async fn widget_error_fails_without_exchange() {
	let fx = fixture(MockBackend::new(), Some(MockWidget::new(Reply::Error(Some("Provider login failed")))));

	let session = fx.controller.connect(&request()).await;

	assert_eq!(session.status, SessionStatus::Failed);
	assert_eq!(session.error_message.as_deref(), Some("Provider login failed"));
	assert_eq!(fx.backend.calls(), (1, 0));
}

#[tokio::test]
async fn widget_error_without_message_uses_fallback() {
	let fx = fixture(MockBackend::new(), Some(MockWidget::new(Reply::Error(None))));

	let session = fx.controller.connect(&request()).await;

	assert_eq!(session.error_message.as_deref(), Some(WIDGET_ERROR_FALLBACK));
}

#[tokio::test]
async fn widget_exit_returns_to_idle_without_error() {
	let fx = fixture(MockBackend::new(), Some(MockWidget::new(Reply::Exit)));

	let session = fx.controller.connect(&request()).await;

	assert_eq!(session.status, SessionStatus::Idle);
	assert!(session.error_message.is_none());
	assert!(session.result_payload.is_none());
	assert_eq!(fx.backend.calls(), (1, 0));
}

#[tokio::test]
async fn retry_after_failure_starts_clean() {
	let widget = MockWidget::new(Reply::Error(Some("Provider login failed")));
	let fx = fixture(MockBackend::new(), Some(widget.clone()));

	let failed = fx.controller.connect(&request()).await;
	assert_eq!(failed.status, SessionStatus::Failed);

	*widget.reply.lock() = Reply::Success("pub_xyz789");
	let retried = fx.controller.connect(&request()).await;

	assert!(retried.id > failed.id);
	assert_eq!(retried.status, SessionStatus::Succeeded);
	assert!(retried.error_message.is_none());
	assert_eq!(retried.result_payload, Some(json!({"company": "Acme"})));
}

#[tokio::test]
async fn invalid_request_fails_before_token_request() {
	let fx = fixture(MockBackend::new(), Some(MockWidget::new(Reply::Success("pub_xyz789"))));
	let mut req = request();
	req.categories.clear();

	let session = fx.controller.connect(&req).await;

	assert_eq!(session.status, SessionStatus::Failed);
	assert!(session.error_message.unwrap().contains("category"));
	assert_eq!(fx.backend.calls(), (0, 0));
}

#[tokio::test]
async fn connect_while_in_flight_is_ignored() {
	let gate = Arc::new(Notify::new());
	let fx = fixture(MockBackend::held(gate.clone()), Some(MockWidget::new(Reply::Success("pub_xyz789"))));
	let mut rx = fx.controller.subscribe();

	let first = {
		let controller = fx.controller.clone();
		tokio::spawn(async move { controller.connect(&request()).await })
	};
	rx.wait_for(|s| s.status == SessionStatus::RequestingToken)
		.await
		.unwrap();
	let in_flight_id = fx.controller.snapshot().id;

	let ignored = fx.controller.connect(&request()).await;
	assert_eq!(ignored.id, in_flight_id);
	assert_eq!(ignored.status, SessionStatus::RequestingToken);

	gate.notify_one();
	let finished = first.await.unwrap();
	assert_eq!(finished.status, SessionStatus::Succeeded);
	assert_eq!(fx.backend.calls(), (1, 1));
}

#[tokio::test]
async fn late_token_after_reset_is_discarded() {
	let gate = Arc::new(Notify::new());
	let widget = MockWidget::new(Reply::Success("pub_xyz789"));
	let fx = fixture(MockBackend::held(gate.clone()), Some(widget.clone()));
	let mut rx = fx.controller.subscribe();

	let stale = {
		let controller = fx.controller.clone();
		tokio::spawn(async move { controller.connect(&request()).await })
	};
	rx.wait_for(|s| s.status == SessionStatus::RequestingToken)
		.await
		.unwrap();

	fx.controller.reset();
	let reset = fx.controller.snapshot();
	gate.notify_one();
	stale.await.unwrap();

	assert_eq!(fx.controller.snapshot(), reset);
	assert_eq!(reset.status, SessionStatus::Idle);
	assert_eq!(widget.opened(), 0, "stale token must not open the widget");
	assert_eq!(fx.backend.calls(), (1, 0));
}

struct DefiningHost {
	scope: Arc<Scope>,
	widget: Option<Arc<MockWidget>>,
	tags: Mutex<Vec<ScriptTag>>,
}

impl ScriptHost for DefiningHost {
	fn inject(&self, tag: ScriptTag) -> BoxFuture<'static, ScriptEvent> {
		self.tags.lock().push(tag);
		match &self.widget {
			Some(widget) => {
				self.scope.define(GLOBAL, widget.clone() as Arc<dyn LinkWidget>);
				future::ready(ScriptEvent::Load).boxed()
			}
			None => future::ready(ScriptEvent::Error("net::ERR_BLOCKED_BY_CLIENT".into())).boxed(),
		}
	}
}

fn bootstrapping(widget: Option<Arc<MockWidget>>) -> (Fixture, Arc<DefiningHost>) {
	let scope: Arc<Scope> = Arc::new(GlobalScope::new());
	let host = Arc::new(DefiningHost {
		scope: scope.clone(),
		widget,
		tags: Mutex::new(Vec::new()),
	});
	let loader = Arc::new(ScriptLoader::new(host.clone(), scope.clone() as Arc<WidgetProvider>));
	let backend = Arc::new(MockBackend::new());
	let config = LinkConfig {
		script: Some(ScriptSource::new(SCRIPT_URL)),
		..LinkConfig::default()
	};
	let controller =
		LinkSessionController::new(backend.clone(), scope.clone(), config).with_script_loader(loader);
	let fx = Fixture {
		controller: Arc::new(controller),
		backend,
		scope,
	};
	(fx, host)
}

#[tokio::test]
async fn missing_widget_is_bootstrapped_from_script() {
	let widget = MockWidget::new(Reply::Success("pub_xyz789"));
	let (fx, host) = bootstrapping(Some(widget.clone()));

	let session = fx.controller.connect(&request()).await;

	assert_eq!(session.status, SessionStatus::Succeeded);
	assert_eq!(host.tags.lock().len(), 1);
	assert_eq!(host.tags.lock()[0].src, SCRIPT_URL);
	assert!(fx.scope.is_present(GLOBAL));
	assert_eq!(widget.opened(), 1);
}

#[tokio::test]
async fn failed_bootstrap_fails_session() {
	let (fx, host) = bootstrapping(None);

	let session = fx.controller.connect(&request()).await;

	assert_eq!(session.status, SessionStatus::Failed);
	assert!(session.error_message.unwrap().contains("net::ERR_BLOCKED_BY_CLIENT"));
	assert_eq!(host.tags.lock().len(), 1);
	assert_eq!(fx.backend.calls(), (0, 0));
}
