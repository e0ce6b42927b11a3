// Integration tests for the quiz client core.
//
// These drive the real `ApiClient` against a scripted HTTP server on a local
// socket and check that the session, the store and the quiz logic agree on
// the full sign-in, take-quiz and sign-out cycle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use quizsmith_core::api::{ApiClient, QuizApi};
use quizsmith_core::model::{Credentials, GenerateRequest, NewQuiz};
use quizsmith_core::quiz::{parse_content, QuizAttempt};
use quizsmith_core::session::{AuthStatus, Session, TOKEN_KEY};
use quizsmith_core::store::LocalStore;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ===========================================================================
// Scripted HTTP server
// ===========================================================================

/// One canned response, matched against the request line prefix.
struct Route {
    request_line: &'static str,
    status: &'static str,
    body: String,
}

fn route(request_line: &'static str, status: &'static str, body: &str) -> Route {
    Route {
        request_line,
        status,
        body: body.to_string(),
    }
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serve `routes` until the test ends. Every received request is appended
/// to the returned log. Unmatched requests get a 404.
async fn serve(routes: Vec<Route>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let routes = Arc::new(routes);
    let log_handle = log.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let routes = routes.clone();
            let log = log_handle.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                let (status, body) = routes
                    .iter()
                    .find(|r| request.starts_with(r.request_line))
                    .map(|r| (r.status, r.body.clone()))
                    .unwrap_or(("404 Not Found", r#"{"detail":"Not Found"}"#.to_string()));
                log.lock().unwrap().push(request);
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.flush().await;
            });
        }
    });

    (format!("http://{addr}/api"), log)
}

fn client(base: &str) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(base, Duration::from_secs(5)).unwrap())
}

fn requests_matching(log: &Arc<Mutex<Vec<String>>>, prefix: &str) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|r| r.starts_with(prefix))
        .cloned()
        .collect()
}

const ME: &str = r#"{"id":1,"email":"ada@example.com","full_name":"Ada Lovelace","avatar":null}"#;

const QUIZ: &str = r#"{
    "id": 12,
    "title": "Planets",
    "description": "A quiz about Planets with 3 questions.",
    "created_at": "2026-03-01T10:00:00+00:00",
    "content": "[{\"question\":\"Largest planet?\",\"options\":[\"Mars\",\"Jupiter\"],\"answer\":\"B\"},{\"question\":\"Red planet?\",\"options\":[\"Mars\",\"Venus\"],\"answer\":\"Mars\"},{\"question\":\"Closest to the sun?\",\"options\":[{\"text\":\"Mercury\",\"is_correct\":true},{\"text\":\"Earth\"}]}]"
}"#;

// ===========================================================================
// Session lifecycle
// ===========================================================================

#[tokio::test]
async fn login_restart_and_logout_cycle() {
    let (base, log) = serve(vec![
        route(
            "POST /api/auth/login ",
            "200 OK",
            r#"{"access_token":"tok-1","token_type":"bearer"}"#,
        ),
        route("GET /api/users/me ", "200 OK", ME),
    ])
    .await;

    let dir = std::env::temp_dir().join("quizsmith_it_session_cycle");
    let _ = std::fs::remove_dir_all(&dir);
    let db_path = dir.join("store.db");
    let db = db_path.to_str().unwrap();

    // First run: anonymous, then log in.
    {
        let api = client(&base);
        let mut session = Session::new(api, LocalStore::open(db).unwrap());
        assert!(session.load_user().await.is_none());
        assert_eq!(session.status(), AuthStatus::Anonymous);

        let user = session
            .login(&Credentials::new("ada@example.com", "secret"))
            .await
            .unwrap();
        assert_eq!(user.display_name(), "Ada Lovelace");
    }

    // Second run: the persisted token restores the session.
    {
        let api = client(&base);
        let mut session = Session::new(api.clone(), LocalStore::open(db).unwrap());
        assert_eq!(api.token().as_deref(), Some("tok-1"));
        assert!(session.load_user().await.is_some());
        assert!(session.is_authenticated());

        session.logout();
        assert!(api.token().is_none());
    }

    // Third run: logged out for good.
    let store = LocalStore::open(db).unwrap();
    assert_eq!(store.get_item(TOKEN_KEY).unwrap(), None);

    let me_requests = requests_matching(&log, "GET /api/users/me ");
    assert_eq!(me_requests.len(), 2);
    assert!(me_requests
        .iter()
        .all(|r| r.to_lowercase().contains("authorization: bearer tok-1")));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn rejected_token_is_cleared_on_startup() {
    let (base, _log) = serve(vec![route(
        "GET /api/users/me ",
        "401 Unauthorized",
        r#"{"detail":"Could not validate credentials"}"#,
    )])
    .await;

    let store = LocalStore::open(":memory:").unwrap();
    store.set_item(TOKEN_KEY, "stale").unwrap();

    let api = client(&base);
    let mut session = Session::new(api.clone(), store);
    assert!(session.load_user().await.is_none());
    assert_eq!(session.status(), AuthStatus::Anonymous);
    assert!(api.token().is_none());
}

#[tokio::test]
async fn registration_error_detail_is_surfaced() {
    let (base, _log) = serve(vec![route(
        "POST /api/auth/register ",
        "400 Bad Request",
        r#"{"detail":"Email already registered"}"#,
    )])
    .await;

    let session = Session::new(client(&base), LocalStore::open(":memory:").unwrap());
    let err = session
        .register(&Credentials::new("ada@example.com", "secret"))
        .await
        .unwrap_err();
    assert_eq!(err.detail(), Some("Email already registered"));
}

// ===========================================================================
// Quizzes
// ===========================================================================

#[tokio::test]
async fn fetched_quiz_is_taken_and_scored() {
    let (base, log) = serve(vec![
        route("GET /api/quizzes/12 ", "200 OK", QUIZ),
        route("POST /api/quizzes/12/score ", "200 OK", r#"{"ok":true}"#),
    ])
    .await;

    let api = client(&base);
    api.set_token(Some("tok-1".into()));

    let detail = api.get_quiz(12).await.unwrap();
    let questions = parse_content(&detail.content).unwrap();
    assert_eq!(questions.len(), 3);

    let mut attempt = QuizAttempt::new(detail.id, detail.title, questions);
    assert!(attempt.select(1)); // Jupiter, letter B
    assert!(attempt.next());
    assert!(attempt.select(1)); // Venus, wrong
    assert!(attempt.next());
    assert!(attempt.select(0)); // flagged Mercury
    assert!(attempt.is_last());

    let result = attempt.finish();
    assert_eq!(result.correct_answers, 2);
    assert_eq!(result.total_questions, 3);
    assert_eq!(result.display_score(), "66.7");

    api.save_score(attempt.quiz_id(), result.score).await.unwrap();
    let saved = requests_matching(&log, "POST /api/quizzes/12/score ");
    assert_eq!(saved.len(), 1);
    assert!(saved[0].contains(r#""score":66.66"#));
}

#[tokio::test]
async fn generated_quiz_is_saved_as_json_string() {
    let (base, log) = serve(vec![
        route(
            "POST /api/generate-quiz ",
            "200 OK",
            r#"{"ok":true,"data":[{"question":"Q1","options":["a","b"],"answer":"A"}]}"#,
        ),
        route("POST /api/quizzes ", "200 OK", r#"{"ok":true,"quiz_id":31}"#),
    ])
    .await;

    let api = client(&base);
    let generated = api
        .generate_quiz(&GenerateRequest::for_topic("Rust", 1))
        .await
        .unwrap();
    let questions = generated.questions().unwrap();

    let saved = api
        .save_quiz(&NewQuiz {
            title: "Rust".into(),
            description: Some("A quiz about Rust with 1 questions.".into()),
            content: serde_json::to_string(questions).unwrap(),
        })
        .await
        .unwrap();
    assert!(saved.ok);
    assert_eq!(saved.quiz_id, Some(31));

    let posted = requests_matching(&log, "POST /api/quizzes ");
    assert_eq!(posted.len(), 1);
    assert!(posted[0].contains(r#""content":"[{\"answer\":\"A\""#));
}

#[tokio::test]
async fn failed_generation_reports_raw_output() {
    let (base, _log) = serve(vec![route(
        "POST /api/generate-quiz ",
        "200 OK",
        r#"{"ok":false,"raw":"Sorry, I cannot do that."}"#,
    )])
    .await;

    let api = client(&base);
    let generated = api
        .generate_quiz(&GenerateRequest::for_topic("Nonsense", 5))
        .await
        .unwrap();
    assert!(generated.questions().is_none());
    assert_eq!(generated.raw.as_deref(), Some("Sorry, I cannot do that."));
}
