//! End-to-end stamping and verification against a scripted HTTP server.
//!
//! The server answers each connection with the next canned reply from its
//! script and records what the client sent, so the tests can pin down the
//! exact number and shape of the round trips.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use aws_lc_rs::signature::{Ed25519KeyPair, KeyPair};

use atum_cache::{Cache, MemoryCache};
use atum_client::{Client, ClientError};
use atum_pow::PowRequest;
use atum_protocol::{
    ClockSource, ErrorCode, PublicKeyCheckResponse, Request, Response, ServerInfo, Signature,
    SignatureAlgorithm, Timestamp, encode_time_nonce,
};

const NOW: i64 = 1_700_000_000;

struct Recorded {
    method: String,
    target: String,
    body: Vec<u8>,
}

struct ScriptedServer {
    url: String,
    handle: thread::JoinHandle<Vec<Recorded>>,
}

impl ScriptedServer {
    /// Serves exactly one connection per scripted reply, in order, then
    /// shuts down. A client that makes more requests than the script
    /// allows gets connection-refused.
    fn serve(replies: Vec<String>) -> ScriptedServer {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut recorded = Vec::new();
            for reply in replies {
                let (stream, _) = listener.accept().unwrap();
                recorded.push(handle_connection(stream, &reply));
            }
            recorded
        });

        ScriptedServer { url, handle }
    }

    fn finish(self) -> Vec<Recorded> {
        self.handle.join().unwrap()
    }
}

fn handle_connection(mut stream: TcpStream, reply_body: &str) -> Recorded {
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':')
            && name.eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse().unwrap();
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).unwrap();

    // "connection: close" keeps the client from pooling the socket, so
    // every request shows up as its own connection.
    let reply = format!(
        "HTTP/1.1 200 OK\r\n\
         content-type: application/json\r\n\
         content-length: {}\r\n\
         connection: close\r\n\r\n{}",
        reply_body.len(),
        reply_body
    );
    stream.write_all(reply.as_bytes()).unwrap();

    Recorded {
        method,
        target,
        body,
    }
}

fn test_keypair() -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed_unchecked(&[7u8; 32]).unwrap()
}

fn signed_stamp(keypair: &Ed25519KeyPair, time: i64, nonce: &[u8]) -> Timestamp {
    Timestamp {
        time,
        server_url: String::new(),
        sig: Signature {
            alg: SignatureAlgorithm::Ed25519,
            data: keypair.sign(&encode_time_nonce(time, nonce)).as_ref().to_vec(),
            public_key: keypair.public_key().as_ref().to_vec(),
        },
        hashing: None,
    }
}

fn stamp_reply(stamp: &Timestamp) -> String {
    serde_json::to_string(&Response {
        error: None,
        stamp: Some(stamp.clone()),
        info: None,
    })
    .unwrap()
}

fn pow_error_reply(code: ErrorCode, info: &ServerInfo) -> String {
    serde_json::to_string(&Response {
        error: Some(code),
        stamp: None,
        info: Some(info.clone()),
    })
    .unwrap()
}

fn check_reply(trusted: bool, expires: i64) -> String {
    serde_json::to_string(&PublicKeyCheckResponse { trusted, expires }).unwrap()
}

fn info_requiring_pow(puzzle: &PowRequest) -> ServerInfo {
    let mut required = BTreeMap::new();
    required.insert(SignatureAlgorithm::Ed25519, puzzle.clone());
    ServerInfo {
        max_nonce_size: 128,
        acceptable_lag: 60,
        default_sig_alg: SignatureAlgorithm::Ed25519,
        required_proof_of_work: required,
    }
}

fn client_for(server: &ScriptedServer, cache: Arc<dyn Cache>) -> Client {
    Client::builder(&server.url)
        .cache(cache)
        .clock_source(ClockSource::new_mock(NOW))
        .build()
}

#[test]
fn stamp_then_verify_round_trip() {
    let keypair = test_keypair();
    let nonce = vec![0x01, 0x02];
    let stamp = signed_stamp(&keypair, NOW, &nonce);

    let server = ScriptedServer::serve(vec![
        stamp_reply(&stamp),
        check_reply(true, NOW + 3600),
    ]);
    let client = client_for(&server, Arc::new(MemoryCache::new()));

    let obtained = client.stamp(nonce.clone()).unwrap();
    assert_eq!(obtained.time, NOW);
    assert_eq!(obtained.server_url, server.url);
    assert_eq!(obtained.sig, stamp.sig);

    assert!(client.verify(&obtained, &nonce).unwrap());

    let recorded = server.finish();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0].method, "POST");
    assert_eq!(recorded[1].method, "GET");
    assert!(recorded[1].target.starts_with("/checkPublicKey?"));
    assert!(recorded[1].target.contains("alg=ed25519"));
}

#[test]
fn verified_trust_is_cached_and_reused() {
    let keypair = test_keypair();
    let nonce = vec![0xab];
    let mut stamp = signed_stamp(&keypair, NOW, &nonce);

    let server = ScriptedServer::serve(vec![check_reply(true, NOW + 3600)]);
    stamp.server_url = server.url.clone();

    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    let client = client_for(&server, Arc::clone(&cache));

    // First verification asks the server; the second must be served
    // entirely from the cache (the script has no second reply).
    assert!(client.verify(&stamp, &nonce).unwrap());
    assert!(client.verify(&stamp, &nonce).unwrap());

    assert_eq!(server.finish().len(), 1);
    assert_eq!(
        cache.public_key_expiry(&stamp.server_url, &stamp.sig.alg, &stamp.sig.public_key),
        Some(NOW + 3600)
    );
}

#[test]
fn expired_cached_trust_forces_a_recheck() {
    let keypair = test_keypair();
    let nonce = vec![0xab];
    let mut stamp = signed_stamp(&keypair, NOW - 10_000, &nonce);

    let server = ScriptedServer::serve(vec![check_reply(true, NOW + 3600)]);
    stamp.server_url = server.url.clone();

    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    // A trust record that has already lapsed must count as never stored.
    cache.store_public_key(
        &stamp.server_url,
        &stamp.sig.alg,
        &stamp.sig.public_key,
        NOW - 1,
    );

    let client = client_for(&server, Arc::clone(&cache));
    assert!(client.verify(&stamp, &nonce).unwrap());

    assert_eq!(server.finish().len(), 1);
    assert_eq!(
        cache.public_key_expiry(&stamp.server_url, &stamp.sig.alg, &stamp.sig.public_key),
        Some(NOW + 3600)
    );
}

#[test]
fn untrusted_key_is_a_negative_result_not_an_error() {
    let keypair = test_keypair();
    let nonce = vec![0xab];
    let mut stamp = signed_stamp(&keypair, NOW, &nonce);

    let server = ScriptedServer::serve(vec![check_reply(false, NOW + 3600)]);
    stamp.server_url = server.url.clone();

    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    let client = client_for(&server, Arc::clone(&cache));

    assert_eq!(client.verify(&stamp, &nonce).unwrap(), false);

    // A rejection is not a trust decision; nothing may be cached.
    assert_eq!(
        cache.public_key_expiry(&stamp.server_url, &stamp.sig.alg, &stamp.sig.public_key),
        None
    );
    server.finish();
}

#[test]
fn key_expiring_before_the_stamp_time_is_an_error() {
    let keypair = test_keypair();
    let nonce = vec![0xab];
    let mut stamp = signed_stamp(&keypair, NOW, &nonce);

    // Trusted, but the vouching ended before the moment the timestamp
    // claims, so the answer proves nothing about that moment.
    let server = ScriptedServer::serve(vec![check_reply(true, NOW - 100)]);
    stamp.server_url = server.url.clone();

    let client = client_for(&server, Arc::new(MemoryCache::new()));
    let result = client.verify(&stamp, &nonce);
    assert!(matches!(
        result,
        Err(ClientError::KeyExpired {
            expires,
            stamp_time,
        }) if expires == NOW - 100 && stamp_time == NOW
    ));
    server.finish();
}

#[test]
fn missing_pow_is_retried_once_with_proof_attached() {
    let keypair = test_keypair();
    let nonce = vec![0x01, 0x02];
    let stamp = signed_stamp(&keypair, NOW, &nonce);

    let puzzle = PowRequest::new(8, vec![0xaa; 16]);
    let server = ScriptedServer::serve(vec![
        pow_error_reply(ErrorCode::MissingProofOfWork, &info_requiring_pow(&puzzle)),
        stamp_reply(&stamp),
    ]);
    let client = client_for(&server, Arc::new(MemoryCache::new()));

    let obtained = client.stamp(nonce.clone()).unwrap();
    assert_eq!(obtained.sig, stamp.sig);

    let recorded = server.finish();
    assert_eq!(recorded.len(), 2);

    // The first attempt went out bare; the second carries a proof that
    // actually solves the advertised puzzle for this (time, nonce).
    let first: Request = serde_json::from_slice(&recorded[0].body).unwrap();
    assert!(first.proof_of_work.is_none());

    let second: Request = serde_json::from_slice(&recorded[1].body).unwrap();
    let proof = second.proof_of_work.expect("retry must attach a proof");
    let payload = encode_time_nonce(second.time.unwrap(), &second.nonce);
    assert!(proof.check(&puzzle, &payload));
    assert_eq!(second.time, Some(NOW));
    assert_eq!(second.nonce, nonce);
}

#[test]
fn pow_failures_stop_after_exactly_two_posts() {
    let puzzle = PowRequest::new(8, vec![0xbb; 16]);
    let info = info_requiring_pow(&puzzle);

    // The script only covers two connections; a third POST would hit a
    // closed listener and fail as a transport error instead.
    let server = ScriptedServer::serve(vec![
        pow_error_reply(ErrorCode::InvalidProofOfWork, &info),
        pow_error_reply(ErrorCode::InvalidProofOfWork, &info),
    ]);
    let client = client_for(&server, Arc::new(MemoryCache::new()));

    let result = client.stamp(vec![0x01]);
    assert!(matches!(
        result,
        Err(ClientError::Server(ErrorCode::InvalidProofOfWork))
    ));
    assert_eq!(server.finish().len(), 2);
}

#[test]
fn pow_error_without_fresh_info_is_a_hard_failure() {
    let reply = serde_json::to_string(&Response {
        error: Some(ErrorCode::MissingProofOfWork),
        stamp: None,
        info: None,
    })
    .unwrap();

    let server = ScriptedServer::serve(vec![reply]);
    let client = client_for(&server, Arc::new(MemoryCache::new()));

    let result = client.stamp(vec![0x01]);
    assert!(matches!(result, Err(ClientError::MissingPowPuzzle)));
    assert_eq!(server.finish().len(), 1);
}

#[test]
fn non_pow_server_errors_are_never_retried() {
    let reply = serde_json::to_string(&Response {
        error: Some(ErrorCode::NonceTooLong),
        stamp: None,
        info: None,
    })
    .unwrap();

    let server = ScriptedServer::serve(vec![reply]);
    let client = client_for(&server, Arc::new(MemoryCache::new()));

    let result = client.stamp(vec![0x01; 64]);
    assert!(matches!(
        result,
        Err(ClientError::Server(ErrorCode::NonceTooLong))
    ));
    assert_eq!(server.finish().len(), 1);
}

#[test]
fn cached_server_info_attaches_pow_on_the_first_post() {
    let keypair = test_keypair();
    let nonce = vec![0x05, 0x06];
    let stamp = signed_stamp(&keypair, NOW, &nonce);

    let puzzle = PowRequest::new(8, vec![0xcc; 16]);
    let server = ScriptedServer::serve(vec![stamp_reply(&stamp)]);

    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    cache.store_server_info(&server.url, &info_requiring_pow(&puzzle));

    let client = client_for(&server, Arc::clone(&cache));
    client.stamp(nonce.clone()).unwrap();

    let recorded = server.finish();
    assert_eq!(recorded.len(), 1);
    let request: Request = serde_json::from_slice(&recorded[0].body).unwrap();
    let proof = request.proof_of_work.expect("cached puzzle must be solved up front");
    assert!(proof.check(&puzzle, &encode_time_nonce(NOW, &nonce)));
}

#[test]
fn overlong_nonce_is_rejected_before_any_post() {
    // No scripted replies: reaching the network would fail differently.
    let server = ScriptedServer::serve(vec![]);

    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    cache.store_server_info(&server.url, &info_requiring_pow(&PowRequest::new(8, vec![0; 16])));

    let client = client_for(&server, Arc::clone(&cache));
    let result = client.stamp(vec![0x01; 256]);
    assert!(matches!(
        result,
        Err(ClientError::NonceTooLong { len: 256, max: 128 })
    ));
    assert_eq!(server.finish().len(), 0);
}

#[test]
fn absurd_pow_difficulty_is_a_hard_error() {
    // A difficulty past the digest length cannot be solved; a hostile
    // server advertising one must produce an error, never a crash or an
    // unbounded search.
    let hostile = PowRequest::new(1000, vec![0xaa; 8]);
    let server = ScriptedServer::serve(vec![pow_error_reply(
        ErrorCode::MissingProofOfWork,
        &info_requiring_pow(&hostile),
    )]);
    let client = client_for(&server, Arc::new(MemoryCache::new()));

    let err = client.stamp(vec![0x01]).unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(server.finish().len(), 1);
}

#[test]
fn hashed_message_round_trip() {
    let keypair = test_keypair();
    let message = b"a rather long document that never leaves this machine";

    // The nonce is derived client-side from a random prefix, so the
    // scripted stamp has to be built from the recorded request. Two
    // phases: stamp first, then build the verification script.
    let server = ScriptedServer::serve(vec![stamp_reply(&signed_stamp(&keypair, NOW, &[]))]);
    let client = client_for(&server, Arc::new(MemoryCache::new()));

    let mut obtained = client.stamp_message(&mut &message[..]).unwrap();
    let recorded = server.finish();
    let request: Request = serde_json::from_slice(&recorded[0].body).unwrap();
    assert_eq!(request.nonce.len(), atum_client::NONCE_SIZE);

    // Re-sign over the real derived nonce, as the server would have.
    obtained.sig = signed_stamp(&keypair, NOW, &request.nonce).sig;

    let server = ScriptedServer::serve(vec![check_reply(true, NOW + 3600)]);
    obtained.server_url = server.url.clone();
    let client = client_for(&server, Arc::new(MemoryCache::new()));

    assert!(client.verify_from(&obtained, &mut &message[..]).unwrap());
    assert!(!client.verify_from(&obtained, &mut &b"tampered document"[..]).unwrap());
    server.finish();

    // `verify` on a hashed timestamp treats its argument as the message
    // and re-derives the nonce, exactly like `verify_from`.
    let server = ScriptedServer::serve(vec![check_reply(true, NOW + 3600)]);
    obtained.server_url = server.url.clone();
    let client = client_for(&server, Arc::new(MemoryCache::new()));

    assert!(client.verify(&obtained, message).unwrap());
    assert!(!client.verify(&obtained, b"tampered document").unwrap());
    server.finish();
}
