//! Stamping and verification against an Atum server.

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use aws_lc_rs::rand::SecureRandom;
use data_encoding::HEXLOWER;
use tracing::{debug, info, warn};

use atum_cache::{Cache, MemoryCache};
use atum_protocol::{
    ClockSource, HashAlgorithm, Hashing, PublicKeyCheckResponse, Request, Response, ServerInfo,
    Timestamp, encode_time_nonce,
};

use crate::error::ClientError;
use crate::sig::{dangerous_verify_signature, derive_nonce};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Size of the random prefix mixed in ahead of a hashed message.
const PREFIX_SIZE: usize = 32;

/// Signals cancellation into in-flight stamping and verification calls.
///
/// Cancellation is cooperative: the client checks the token before each
/// network round trip and before computing a proof of work, the points
/// where it would otherwise commit to significant waiting.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ClientError> {
        if self.is_cancelled() {
            Err(ClientError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A client bound to one Atum server.
///
/// Cloneable and safe to share across threads; concurrent calls interleave
/// freely, with the cache resolving races by last-write-wins.
#[derive(Clone)]
pub struct Client {
    server_url: String,
    agent: ureq::Agent,
    cache: Arc<dyn Cache>,
    clock: ClockSource,
    cancel: CancelToken,
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    server_url: String,
    timeout: Duration,
    cache: Option<Arc<dyn Cache>>,
    clock: ClockSource,
    cancel: CancelToken,
}

impl ClientBuilder {
    /// Uses the given cache instead of a fresh [`MemoryCache`]. Share one
    /// instance across clients to share trust decisions between them.
    pub fn cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Global timeout applied to every HTTP round trip.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn clock_source(mut self, clock: ClockSource) -> Self {
        self.clock = clock;
        self
    }

    /// Attach a cancellation token; cancel it to abort in-flight calls at
    /// their next checkpoint.
    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn build(self) -> Client {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build();

        Client {
            server_url: self.server_url,
            agent: config.new_agent(),
            cache: self.cache.unwrap_or_else(|| Arc::new(MemoryCache::new())),
            clock: self.clock,
            cancel: self.cancel,
        }
    }
}

impl Client {
    /// Starts building a client for the server at `server_url`.
    pub fn builder(server_url: &str) -> ClientBuilder {
        ClientBuilder {
            server_url: normalize_server_url(server_url),
            timeout: DEFAULT_TIMEOUT,
            cache: None,
            clock: ClockSource::System,
            cancel: CancelToken::new(),
        }
    }

    /// A client with default settings: in-memory cache, system clock,
    /// ten-second timeout.
    pub fn new(server_url: &str) -> Client {
        Client::builder(server_url).build()
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Requests a timestamp on `nonce` using the server's default
    /// signature algorithm.
    pub fn stamp(&self, nonce: Vec<u8>) -> Result<Timestamp, ClientError> {
        self.send_request(Request::new(nonce))
    }

    /// Like [`stamp`](Client::stamp), returning the timestamp serialized
    /// as JSON, ready to be persisted.
    pub fn stamp_json(&self, nonce: Vec<u8>) -> Result<String, ClientError> {
        Ok(serde_json::to_string(&self.stamp(nonce)?)?)
    }

    /// Requests a timestamp on a long message.
    ///
    /// The message is reduced to a nonce by hashing it behind a freshly
    /// drawn random prefix, so the server never sees a bare hash of the
    /// plaintext. The returned timestamp carries the prefix in its
    /// `hashing` field; keep it, verification needs it.
    pub fn stamp_message(&self, message: &mut dyn Read) -> Result<Timestamp, ClientError> {
        let mut prefix = vec![0u8; PREFIX_SIZE];
        aws_lc_rs::rand::SystemRandom::new()
            .fill(&mut prefix)
            .map_err(|_| std::io::Error::other("system random source unavailable"))?;

        let hashing = Hashing {
            hash: HashAlgorithm::Shake256,
            prefix,
        };
        let nonce = derive_nonce(&hashing.hash, &hashing.prefix, message)?;

        let mut stamp = self.send_request(Request::new(nonce))?;
        stamp.hashing = Some(hashing);
        Ok(stamp)
    }

    /// Sends a prepared [`Request`], driving the bounded retry state
    /// machine: at most two POSTs, the second only after the server
    /// signalled a proof-of-work mismatch and supplied fresh puzzle
    /// parameters.
    pub fn send_request(&self, mut request: Request) -> Result<Timestamp, ClientError> {
        if request.nonce.is_empty() {
            return Err(ClientError::EmptyNonce);
        }
        if request.time.is_none() {
            request.time = Some(self.clock.epoch_seconds());
        }

        let mut info = self.cache.server_info(&self.server_url);

        for attempt in 0..2 {
            self.cancel.check()?;

            if let Some(info) = &info {
                if request.nonce.len() as i64 > info.max_nonce_size {
                    return Err(ClientError::NonceTooLong {
                        len: request.nonce.len(),
                        max: info.max_nonce_size,
                    });
                }
                self.attach_proof_of_work(&mut request, info)?;
            }

            debug!(
                server = %self.server_url,
                attempt,
                pow = request.proof_of_work.is_some(),
                "requesting timestamp"
            );
            let response = self.post_request(&request)?;

            if let Some(new_info) = &response.info {
                self.cache.store_server_info(&self.server_url, new_info);
            }

            match response.error {
                None => {
                    let mut stamp = response.stamp.ok_or(ClientError::EmptyReply)?;
                    stamp.server_url = self.server_url.clone();
                    info!(server = %self.server_url, time = stamp.time, "timestamp obtained");
                    return Ok(stamp);
                }
                Some(code) if code.is_pow_error() && attempt == 0 => {
                    // The puzzle we solved (or skipped) no longer matches
                    // what the server wants; its reply told us what does.
                    warn!(server = %self.server_url, error = %code, "renegotiating proof of work");
                    match response.info {
                        Some(new_info) => info = Some(new_info),
                        None => return Err(ClientError::MissingPowPuzzle),
                    }
                }
                Some(code) => return Err(ClientError::Server(code)),
            }
        }

        unreachable!("the second pass either returns a stamp or a hard error")
    }

    /// Solves and attaches the puzzle the server demands for the effective
    /// signature algorithm, if any. A proof computed on the first attempt
    /// is recomputed from scratch when the puzzle changed.
    fn attach_proof_of_work(
        &self,
        request: &mut Request,
        info: &ServerInfo,
    ) -> Result<(), ClientError> {
        let alg = request
            .preferred_sig_alg
            .as_ref()
            .unwrap_or(&info.default_sig_alg);

        let Some(puzzle) = info.required_pow(alg) else {
            request.proof_of_work = None;
            return Ok(());
        };

        self.cancel.check()?;

        // Binds the proof to this exact request.
        let payload = encode_time_nonce(request.time.unwrap_or_default(), &request.nonce);
        debug!(alg = %alg, difficulty = puzzle.difficulty, "solving proof of work");
        request.proof_of_work = Some(puzzle.fulfil(&payload));
        Ok(())
    }

    fn post_request(&self, request: &Request) -> Result<Response, ClientError> {
        let mut reply = self
            .agent
            .post(&self.server_url)
            .content_type("application/json")
            .send_json(request)?;
        Ok(reply.body_mut().read_json::<Response>()?)
    }

    /// Verifies a timestamp against the bytes it was set on.
    ///
    /// For a timestamp set on a raw nonce the bytes are checked as-is; a
    /// timestamp that carries hashing parameters is treated as set on a
    /// message and the nonce is re-derived from `nonce` first, exactly as
    /// [`Client::verify_from`] would.
    ///
    /// Returns `Ok(true)` when the timestamp is valid, `Ok(false)` when it
    /// completed verification and is not, and an error when verification
    /// could not be completed at all.
    pub fn verify(&self, stamp: &Timestamp, nonce: &[u8]) -> Result<bool, ClientError> {
        match &stamp.hashing {
            None => self.verify_nonce(stamp, nonce),
            Some(_) => self.verify_from(stamp, &mut &nonce[..]),
        }
    }

    /// Verifies a timestamp against the original message, re-deriving the
    /// nonce when the timestamp was set on a hashed message.
    pub fn verify_from(
        &self,
        stamp: &Timestamp,
        message: &mut dyn Read,
    ) -> Result<bool, ClientError> {
        let nonce = match &stamp.hashing {
            Some(hashing) => derive_nonce(&hashing.hash, &hashing.prefix, message)?,
            None => {
                let mut nonce = Vec::new();
                message.read_to_end(&mut nonce)?;
                nonce
            }
        };
        self.verify_nonce(stamp, &nonce)
    }

    /// Trust check first, signature second. Signature verification alone
    /// proves nothing here: any key can produce a valid signature, so the
    /// server must vouch for this specific key before the signature means
    /// anything.
    fn verify_nonce(&self, stamp: &Timestamp, nonce: &[u8]) -> Result<bool, ClientError> {
        if !self.check_public_key(stamp)? {
            info!(server = %stamp.server_url, "server does not vouch for the signing key");
            return Ok(false);
        }
        dangerous_verify_signature(&stamp.sig, stamp.time, nonce)
    }

    /// Establishes whether the server behind `stamp.server_url` vouches
    /// for the key that signed it, consulting the cache first.
    fn check_public_key(&self, stamp: &Timestamp) -> Result<bool, ClientError> {
        let server_url = normalize_server_url(&stamp.server_url);
        let alg = &stamp.sig.alg;
        let public_key = &stamp.sig.public_key;

        if let Some(expires) = self.cache.public_key_expiry(&server_url, alg, public_key) {
            // Expired entries count as never stored.
            if expires > self.clock.epoch_seconds() {
                debug!(server = %server_url, expires, "public key trusted from cache");
                return Ok(true);
            }
        }

        self.cancel.check()?;

        let url = format!("{server_url}checkPublicKey");
        let mut reply = self
            .agent
            .get(&url)
            .query("alg", alg.as_str())
            .query("pk", &HEXLOWER.encode(public_key))
            .call()?;
        let check = reply.body_mut().read_json::<PublicKeyCheckResponse>()?;

        // The key must have been vouched for at the moment the timestamp
        // claims, not merely at some point.
        if check.expires < stamp.time {
            return Err(ClientError::KeyExpired {
                expires: check.expires,
                stamp_time: stamp.time,
            });
        }

        if !check.trusted {
            return Ok(false);
        }

        self.cache
            .store_public_key(&server_url, alg, public_key, check.expires);
        debug!(server = %server_url, expires = check.expires, "public key trusted by server");
        Ok(true)
    }
}

/// Ensures the base URL ends in a slash so path suffixes append cleanly.
fn normalize_server_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}
