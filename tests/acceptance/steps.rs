use crate::SweepWorld;
use crate::fake_server::{self, FakeServer, RecordedRequest};
use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use serde_json::json;

const PROJECT_ID: u64 = 5;
const CHAT_PASSWORD: &str = "secret";

fn closed_issue(iid: u64, title: &str) -> serde_json::Value {
    json!({
        "id": 1000 + iid,
        "iid": iid,
        "project_id": PROJECT_ID,
        "title": title,
        "state": "closed",
        "created_at": "2024-01-02T03:04:05.000Z",
        "updated_at": "2024-01-03T03:04:05.000Z",
        "closed_at": "2024-01-03T03:04:05.000Z"
    })
}

fn requests(world: &SweepWorld) -> Vec<RecordedRequest> {
    world
        .server
        .as_ref()
        .map(FakeServer::requests)
        .unwrap_or_default()
}

fn searches(world: &SweepWorld) -> Vec<u64> {
    world
        .server
        .as_ref()
        .map(FakeServer::searches)
        .unwrap_or_default()
}

fn deletes(world: &SweepWorld) -> Vec<String> {
    world
        .server
        .as_ref()
        .map(FakeServer::deletes)
        .unwrap_or_default()
}

fn requests_matching(world: &SweepWorld, method: &str, path_part: &str) -> Vec<RecordedRequest> {
    requests(world)
        .into_iter()
        .filter(|r| r.method == method && r.target.contains(path_part))
        .collect()
}

#[given("the closed issues on page 1 are:")]
async fn given_closed_issues(world: &mut SweepWorld, step: &Step) {
    let table = step.table.as_ref().expect("Expected a table of issues");
    let issues = table
        .rows
        .iter()
        .skip(1)
        .map(|row| {
            let iid = row[0].parse::<u64>().expect("iid must be a number");
            closed_issue(iid, &row[1])
        })
        .collect();
    world.setup.issue_pages = vec![issues];
}

#[given(regex = r"^(\d+) closed issues on page 1$")]
async fn given_full_page(world: &mut SweepWorld, count: u64) {
    let issues = (1..=count)
        .map(|iid| closed_issue(iid, &format!("Issue {iid}")))
        .collect();
    world.setup.issue_pages = vec![issues];
}

#[given("no closed issues")]
async fn given_no_closed_issues(world: &mut SweepWorld) {
    world.setup.issue_pages.clear();
}

#[given(regex = r#"^branch "([^"]*)" exists for issue (\d+)$"#)]
async fn given_branch_exists(world: &mut SweepWorld, name: String, iid: u64) {
    world.setup.branches.entry(iid).or_default().push(name);
}

#[given(regex = r#"^deleting branch "([^"]*)" returns status (\d+)$"#)]
async fn given_delete_status(world: &mut SweepWorld, name: String, status: u16) {
    world.setup.delete_status.insert(name, status);
}

#[given(regex = r"^listing closed issues returns status (\d+)$")]
async fn given_listing_status(world: &mut SweepWorld, status: u16) {
    world.setup.issue_listing_status = Some(status);
}

#[given(regex = r"^searching branches for issue (\d+) returns status (\d+)$")]
async fn given_search_status(world: &mut SweepWorld, iid: u64, status: u16) {
    world.setup.branch_search_status.insert(iid, status);
}

#[given(regex = r"^searching branches for issue (\d+) returns something other than a list$")]
async fn given_search_garbage(world: &mut SweepWorld, iid: u64) {
    world.setup.branch_search_garbage.insert(iid);
}

#[given("the chat service rejects messages")]
async fn given_chat_rejects(world: &mut SweepWorld) {
    world.setup.reject_messages = true;
}

#[given("the GitLab service is unreachable")]
async fn given_gitlab_unreachable(world: &mut SweepWorld) {
    world.gitlab_unreachable = true;
}

async fn run_sweep(world: &mut SweepWorld, chat_password: &str, extra: &[String]) {
    let mut state = std::mem::take(&mut world.setup);
    state.chat_password = CHAT_PASSWORD.to_string();
    let server = FakeServer::start(state).await;

    let gitlab_url = if world.gitlab_unreachable {
        fake_server::closed_port_url().await
    } else {
        server.base_url.clone()
    };

    let mut args: Vec<String> = vec![
        "branchsweep".to_string(),
        "--glurl".to_string(),
        gitlab_url,
        "--gltoken".to_string(),
        "gl-token".to_string(),
        "--glproject".to_string(),
        PROJECT_ID.to_string(),
        "--rurl".to_string(),
        server.base_url.clone(),
        "--ruser".to_string(),
        "bot".to_string(),
        "--rpass".to_string(),
        chat_password.to_string(),
        "--rch".to_string(),
        "#dev".to_string(),
    ];
    args.extend(extra.iter().cloned());

    let mut buffer: Vec<u8> = Vec::new();
    let writer_option: Option<&mut dyn std::io::Write> = Some(&mut buffer);
    let result = branchsweep::run::run(args, writer_option).await;

    world.captured_output = buffer;
    world.run_result = Some(result);
    world.server = Some(server);
}

#[when("I run the sweep")]
async fn when_run_sweep(world: &mut SweepWorld) {
    run_sweep(world, CHAT_PASSWORD, &[]).await;
}

#[when(regex = r#"^I run the sweep with "([^"]*)"$"#)]
async fn when_run_sweep_with(world: &mut SweepWorld, flags: String) {
    let extra: Vec<String> = flags.split_whitespace().map(String::from).collect();
    run_sweep(world, CHAT_PASSWORD, &extra).await;
}

#[when("I run the sweep with a wrong chat password")]
async fn when_run_sweep_wrong_password(world: &mut SweepWorld) {
    run_sweep(world, "wrong", &[]).await;
}

#[then("the sweep should succeed")]
async fn then_sweep_succeeds(world: &mut SweepWorld) {
    match &world.run_result {
        Some(Ok(())) => {}
        other => panic!("Expected the sweep to succeed, got {:?}", other),
    }
}

#[then("the sweep should fail")]
async fn then_sweep_fails(world: &mut SweepWorld) {
    assert!(
        matches!(world.run_result, Some(Err(_))),
        "Expected the sweep to fail, got {:?}",
        world.run_result
    );
}

#[then(regex = r"^(\d+) issue pages? should have been requested$")]
async fn then_pages_requested(world: &mut SweepWorld, count: usize) {
    let pages = requests_matching(world, "GET", "/issues?");
    assert_eq!(pages.len(), count, "Page requests: {:?}", pages);
    for (index, request) in pages.iter().enumerate() {
        assert!(
            request.target.contains(&format!("page={}&", index + 1)),
            "Unexpected page request order: {:?}",
            pages
        );
        assert!(request.target.contains("state=closed"));
        assert!(request.target.contains("per_page=100"));
        assert!(request.target.contains("order_by=updated_at&sort=desc"));
    }
}

#[then(regex = r"^(\d+) delete requests? should have been made$")]
async fn then_delete_count(world: &mut SweepWorld, count: usize) {
    let deletes = requests_matching(world, "DELETE", "/repository/branches/");
    assert_eq!(deletes.len(), count, "Delete requests: {:?}", deletes);
}

#[then(regex = r#"^branch "([^"]*)" should have been deleted$"#)]
async fn then_branch_deleted(world: &mut SweepWorld, name: String) {
    let deletes = deletes(world);
    assert_eq!(
        deletes.iter().filter(|deleted| **deleted == name).count(),
        1,
        "Deleted branches: {:?}",
        deletes
    );
}

#[then(regex = r"^a branch search should have been made for issue (\d+)$")]
async fn then_searched(world: &mut SweepWorld, iid: u64) {
    let searches = searches(world);
    assert!(searches.contains(&iid), "Branch searches: {:?}", searches);
}

#[then(regex = r"^no branch search should have been made for issue (\d+)$")]
async fn then_no_search(world: &mut SweepWorld, iid: u64) {
    let searches = searches(world);
    assert!(!searches.contains(&iid), "Unexpected searches: {:?}", searches);
}

#[then(regex = r"^(\d+) notifications? should have been sent$")]
async fn then_notification_count(world: &mut SweepWorld, count: usize) {
    let posts = requests_matching(world, "POST", "/api/v1/chat.postMessage");
    assert_eq!(posts.len(), count, "Chat posts: {:?}", posts);
}

#[then(regex = r#"^a notification to "([^"]*)" should contain "(.*)"$"#)]
async fn then_notification_contains(world: &mut SweepWorld, channel: String, text: String) {
    let posts = requests_matching(world, "POST", "/api/v1/chat.postMessage");
    let found = posts.iter().any(|post| {
        let body: serde_json::Value =
            serde_json::from_str(&post.body).expect("Chat post body is not JSON");
        body["channel"] == channel.as_str()
            && body["text"]
                .as_str()
                .is_some_and(|message| message.contains(&text))
    });
    assert!(found, "No notification containing '{}' in {:?}", text, posts);
}

#[then(regex = r#"^the output should contain "(.*)"$"#)]
async fn then_output_contains(world: &mut SweepWorld, expected: String) {
    let output = String::from_utf8(world.captured_output.clone()).expect("Invalid UTF-8");
    assert!(
        output.contains(&expected),
        "Expected output to contain '{}', but got:\n---\n{}\n---",
        expected,
        output
    );
}

#[then("every GitLab request should carry the private token")]
async fn then_requests_carry_token(world: &mut SweepWorld) {
    let gitlab_requests: Vec<RecordedRequest> = requests(world)
        .into_iter()
        .filter(|r| r.target.starts_with("/api/v4/"))
        .collect();
    assert!(!gitlab_requests.is_empty());
    for request in &gitlab_requests {
        assert_eq!(request.header("private-token"), Some("gl-token"), "{:?}", request);
        assert_eq!(
            request.header("content-type"),
            Some("application/json"),
            "{:?}",
            request
        );
    }
}

#[then("the chat login should have been attempted")]
async fn then_login_attempted(world: &mut SweepWorld) {
    let logins = requests_matching(world, "POST", "/api/v1/login");
    assert_eq!(logins.len(), 1, "Login requests: {:?}", logins);
}
