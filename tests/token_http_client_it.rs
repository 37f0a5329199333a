// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use url::form_urlencoded;
// self
use oauth2_token_broker::{
	_preludet::*,
	config::{CredentialConfig, GrantType},
	error::TransportError,
	flows::{Acquisition, Broker},
	http::TokenHttpClient,
	oauth::{
		TransportErrorMapper,
		oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::StatusCode},
	},
	store::{BrokerStore, MemoryStore},
};

#[derive(Debug)]
enum FakeTransportError {
	Refused,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Refused => write!(f, "Connection refused."),
		}
	}
}
impl StdError for FakeTransportError {}

enum Script {
	Respond { status: u16, body: &'static str },
	Refuse,
}

/// In-process transport that counts calls, records requests, and replies after a delay.
struct ScriptedState {
	script: Script,
	delay: std::time::Duration,
	calls: AtomicUsize,
	requests: Mutex<Vec<HttpRequest>>,
}

#[derive(Clone)]
struct ScriptedHttpClient(Arc<ScriptedState>);
impl ScriptedHttpClient {
	fn respond(status: u16, body: &'static str) -> Self {
		Self::new(Script::Respond { status, body }, std::time::Duration::ZERO)
	}

	fn new(script: Script, delay: std::time::Duration) -> Self {
		Self(Arc::new(ScriptedState {
			script,
			delay,
			calls: AtomicUsize::new(0),
			requests: Mutex::new(Vec::new()),
		}))
	}

	fn delayed(mut self, delay: std::time::Duration) -> Self {
		let state = Arc::get_mut(&mut self.0).expect("Scripted client should not be shared yet.");

		state.delay = delay;

		self
	}

	fn calls(&self) -> usize {
		self.0.calls.load(Ordering::SeqCst)
	}

	fn recorded_form(&self, index: usize) -> Vec<(String, String)> {
		let requests = self.0.requests.lock();
		let request = requests.get(index).expect("Request should have been recorded.");

		form_urlencoded::parse(request.body()).into_owned().collect()
	}
}
impl TokenHttpClient for ScriptedHttpClient {
	type Handle = ScriptedHandle;
	type TransportError = FakeTransportError;

	fn handle(&self) -> Self::Handle {
		ScriptedHandle(self.0.clone())
	}
}

struct ScriptedHandle(Arc<ScriptedState>);
impl<'a> AsyncHttpClient<'a> for ScriptedHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		let state = self.0.clone();

		Box::pin(async move {
			state.calls.fetch_add(1, Ordering::SeqCst);
			state.requests.lock().push(request);

			tokio::time::sleep(state.delay).await;

			match state.script {
				Script::Respond { status, body } => {
					let mut response = HttpResponse::new(body.as_bytes().to_vec());

					*response.status_mut() =
						StatusCode::from_u16(status).expect("Scripted status should be valid.");

					Ok(response)
				},
				Script::Refuse => Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Refused))),
			}
		})
	}
}

#[derive(Clone, Default)]
struct FakeTransportErrorMapper {
	grants: Arc<Mutex<Vec<GrantType>>>,
}
impl TransportErrorMapper<FakeTransportError> for FakeTransportErrorMapper {
	fn map_transport_error(&self, grant: GrantType, err: HttpClientError<FakeTransportError>) -> Error {
		self.grants.lock().push(grant);

		match err {
			HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			other => panic!("Unexpected HTTP client error variant: {other:?}."),
		}
	}
}

type ScriptedBroker = Broker<ScriptedHttpClient, FakeTransportErrorMapper>;

fn build_broker(
	http_client: &ScriptedHttpClient,
	mapper: &FakeTransportErrorMapper,
) -> (ScriptedBroker, Arc<MemoryStore>) {
	let store_backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn BrokerStore> = store_backend.clone();
	let broker = Broker::with_http_client(store, http_client.clone(), mapper.clone());

	(broker, store_backend)
}

fn build_config() -> CredentialConfig {
	enabled_config_builder("https://auth.test/token", "c1", "s1", "read")
		.build()
		.expect("Client credentials configuration should build successfully.")
}

const TOKEN_BODY: &str = "{\"access_token\":\"abc123\",\"expires_in\":3600,\"token_type\":\"Bearer\"}";

#[tokio::test]
async fn concurrent_misses_each_exchange_without_singleflight() {
	let http_client =
		ScriptedHttpClient::respond(200, TOKEN_BODY).delayed(std::time::Duration::from_millis(50));
	let mapper = FakeTransportErrorMapper::default();
	let (broker, store) = build_broker(&http_client, &mapper);
	let config = build_config();
	let (a, b, c, d) = tokio::join!(
		broker.acquire(&config),
		broker.acquire(&config),
		broker.acquire(&config),
		broker.acquire(&config),
	);

	for result in [a, b, c, d] {
		assert!(result.expect("Concurrent acquisition should succeed.").is_authenticated());
	}

	// Every caller observed the miss before any exchange completed.
	assert_eq!(http_client.calls(), 4);
	assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn singleflight_coalesces_concurrent_misses() {
	let http_client =
		ScriptedHttpClient::respond(200, TOKEN_BODY).delayed(std::time::Duration::from_millis(50));
	let mapper = FakeTransportErrorMapper::default();
	let (broker, _store) = build_broker(&http_client, &mapper);
	let broker = broker.with_singleflight(true);
	let config = build_config();
	let (a, b, c, d) = tokio::join!(
		broker.acquire(&config),
		broker.acquire(&config),
		broker.acquire(&config),
		broker.acquire(&config),
	);
	let tokens = [a, b, c, d].map(|result| {
		result
			.expect("Concurrent acquisition should succeed.")
			.into_token()
			.expect("Concurrent acquisition should yield a token.")
	});

	assert!(tokens.iter().all(|token| Arc::ptr_eq(token, &tokens[0])));
	assert_eq!(http_client.calls(), 1);
}

#[test]
fn concurrent_readers_on_many_threads_share_one_cache() {
	let http_client = ScriptedHttpClient::respond(200, TOKEN_BODY);
	let mapper = FakeTransportErrorMapper::default();
	let (broker, store) = build_broker(&http_client, &mapper);
	let broker = Arc::new(broker);
	let config = Arc::new(build_config());
	let block_on = |broker: Arc<ScriptedBroker>, config: Arc<CredentialConfig>| {
		tokio::runtime::Builder::new_current_thread()
			.enable_time()
			.build()
			.expect("Runtime should build.")
			.block_on(async move { broker.acquire(&config).await })
	};

	block_on(broker.clone(), config.clone()).expect("Warm-up acquisition should succeed.");

	let workers = (0..32)
		.map(|_| {
			let broker = broker.clone();
			let config = config.clone();

			std::thread::spawn(move || block_on(broker, config))
		})
		.collect::<Vec<_>>();

	for worker in workers {
		let acquisition = worker
			.join()
			.expect("Worker thread should not panic.")
			.expect("Worker acquisition should succeed.");

		assert!(acquisition.is_authenticated());
	}

	assert_eq!(http_client.calls(), 1);
	assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn slow_exchange_times_out_without_touching_the_cache() {
	let http_client =
		ScriptedHttpClient::respond(200, TOKEN_BODY).delayed(std::time::Duration::from_millis(500));
	let mapper = FakeTransportErrorMapper::default();
	let (broker, store) = build_broker(&http_client, &mapper);
	let config = enabled_config_builder("https://auth.test/token", "c1", "s1", "read")
		.request_timeout(Duration::milliseconds(50))
		.build()
		.expect("Configuration with short timeout should build successfully.");
	let err = broker.acquire(&config).await.expect_err("Slow exchange should time out.");

	match err {
		Error::Transport(TransportError::Timeout { after }) =>
			assert_eq!(after, Duration::milliseconds(50)),
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert!(store.is_empty());
	assert_eq!(http_client.calls(), 1);
}

#[test]
#[should_panic(expected = "timers are disabled")]
fn acquisition_requires_a_runtime_with_timers() {
	let http_client = ScriptedHttpClient::respond(200, TOKEN_BODY);
	let mapper = FakeTransportErrorMapper::default();
	let (broker, _store) = build_broker(&http_client, &mapper);
	let config = build_config();
	let runtime =
		tokio::runtime::Builder::new_current_thread().build().expect("Runtime should build.");
	let _ = runtime.block_on(broker.acquire(&config));
}

#[tokio::test]
async fn transport_failures_flow_through_the_mapper() {
	let http_client = ScriptedHttpClient::new(Script::Refuse, std::time::Duration::ZERO);
	let mapper = FakeTransportErrorMapper::default();
	let (broker, store) = build_broker(&http_client, &mapper);
	let config = enabled_config_builder("https://auth.test/token", "c1", "s1", "read")
		.grant_type(GrantType::Password)
		.username("alice")
		.password("wonderland")
		.build()
		.expect("Password configuration should build successfully.");
	let err = broker.acquire(&config).await.expect_err("Refused connection should fail.");

	assert!(err.is_transport());
	assert!(store.is_empty());
	assert_eq!(*mapper.grants.lock(), vec![GrantType::Password]);
}

#[tokio::test]
async fn requests_carry_grant_specific_form_parameters() {
	let http_client = ScriptedHttpClient::respond(200, TOKEN_BODY);
	let mapper = FakeTransportErrorMapper::default();
	let (broker, _store) = build_broker(&http_client, &mapper);
	let client_config = enabled_config_builder("https://auth.test/token", "c1", "s1", "")
		.build()
		.expect("Client credentials configuration should build successfully.");
	let password_config = enabled_config_builder("https://auth.test/token", "c1", "s1", "other")
		.grant_type(GrantType::Password)
		.username("alice")
		.password("wonder land")
		.build()
		.expect("Password configuration should build successfully.");

	broker.acquire(&client_config).await.expect("Client credentials grant should succeed.");
	broker.acquire(&password_config).await.expect("Password grant should succeed.");

	assert_eq!(
		http_client.recorded_form(0),
		vec![
			("grant_type".into(), "client_credentials".into()),
			("client_id".into(), "c1".into()),
			("client_secret".into(), "s1".into()),
			("scope".into(), String::new()),
		]
	);
	assert_eq!(
		http_client.recorded_form(1),
		vec![
			("grant_type".into(), "password".into()),
			("username".into(), "alice".into()),
			("password".into(), "wonder land".into()),
			("scope".into(), "other".into()),
		]
	);
}

#[tokio::test]
async fn disabled_configuration_never_reaches_the_transport() {
	let http_client = ScriptedHttpClient::respond(200, TOKEN_BODY);
	let mapper = FakeTransportErrorMapper::default();
	let (broker, _store) = build_broker(&http_client, &mapper);
	let config = CredentialConfig::builder().build().expect("Defaults should build successfully.");

	for _ in 0..3 {
		let acquisition = broker.acquire(&config).await.expect("Disabled acquisition never fails.");

		assert!(matches!(acquisition, Acquisition::Unauthenticated));
	}

	assert_eq!(http_client.calls(), 0);
}
