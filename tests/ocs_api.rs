//! End-to-end tests against a gateway bound to an ephemeral port.

mod common;

use common::{password, spawn_gateway, spawn_gateway_with, ALICE_QUOTA, ALICE_USED};
use ocs_client::Format;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Method;
use serde_json::json;

/// (name, text) of every direct child of `<data>`.
fn xml_data_children(doc: &str) -> Vec<(String, String)> {
    let mut reader = Reader::from_str(doc);
    reader.config_mut().trim_text(true);
    let mut depth_names: Vec<String> = Vec::new();
    let mut out: Vec<(String, String)> = Vec::new();
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) => {
                let name = String::from_utf8(e.name().as_ref().to_vec()).unwrap();
                if depth_names.last().map(String::as_str) == Some("data") {
                    out.push((name.clone(), String::new()));
                }
                depth_names.push(name);
            }
            Event::Text(t) => {
                let n = depth_names.len();
                if n >= 2 && depth_names[n - 2] == "data" {
                    if let Some(last) = out.last_mut() {
                        last.1 = t.unescape().unwrap().into_owned();
                    }
                }
            }
            Event::End(_) => {
                depth_names.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }
    out
}

#[tokio::test]
async fn test_config_in_both_formats() {
    let gw = spawn_gateway().await;
    let client = gw.anonymous();

    let xml = client.config(Format::Xml).await.unwrap();
    assert_eq!(xml.status, 200);
    assert!(xml
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("application/xml"));
    assert!(xml.body.starts_with(r#"<?xml version="1.0"?>"#));
    assert!(xml.body.contains("<version>1.7</version><website>ownCloud</website>"));

    let reply = client.config(Format::Json).await.unwrap();
    let json = reply.json().unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["statuscode"], 100);
    assert_eq!(json["totalitems"], "");
    assert_eq!(json["data"]["version"], "1.7");
    assert_eq!(json["data"]["ssl"], "false");
    assert_eq!(json["data"]["host"], gw.addr.to_string());
}

#[tokio::test]
async fn test_config_round_trips_in_both_formats() {
    let gw = spawn_gateway().await;
    let client = gw.anonymous();

    let xml = client.config(Format::Xml).await.unwrap();
    let from_xml = xml_data_children(&xml.body);

    let json = client.config(Format::Json).await.unwrap().json().unwrap();
    let from_json: Vec<(String, String)> = json["data"]
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.as_str().unwrap().to_string()))
        .collect();

    let keys: Vec<_> = from_xml.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["version", "website", "host", "contact", "ssl"]);

    let mut from_xml = from_xml;
    let mut from_json = from_json;
    from_xml.sort();
    from_json.sort();
    assert_eq!(from_xml, from_json);
}

#[tokio::test]
async fn test_configured_host_overrides_request() {
    let gw = spawn_gateway_with(|c| c.ocs.host = Some("cloud.example.org".into())).await;
    let json = gw.anonymous().config(Format::Json).await.unwrap().json().unwrap();
    assert_eq!(json["data"]["host"], "cloud.example.org");
}

#[tokio::test]
async fn test_wrong_method_falls_through_to_999() {
    let gw = spawn_gateway().await;
    let client = gw.client("alice");

    // The fallback follows the format parameter, not the path suffix.
    let reply = client.post("/config.json", &[]).await.unwrap();
    assert_eq!(reply.status, 200);
    assert!(reply.body.contains("<status>failed</status><statuscode>999</statuscode>"));

    let reply = client
        .post("/config.json", &[("format", "json")])
        .await
        .unwrap();
    assert_eq!(reply.json().unwrap()["statuscode"], 999);

    let reply = client
        .get("/person/check.json", &[("format", "json")])
        .await
        .unwrap();
    assert_eq!(reply.json().unwrap()["statuscode"], 999);

    for method in [Method::PUT, Method::DELETE] {
        let reply = client.request(method, "/cloud/user/alice.json").await.unwrap();
        assert_eq!(reply.status, 200);
        assert!(reply.body.contains("<statuscode>999</statuscode>"));
    }
}

#[tokio::test]
async fn test_unknown_format_never_matches() {
    let gw = spawn_gateway().await;
    let client = gw.client("alice");
    for path in ["/config.yaml", "/activity.html", "/cloud/user/alice.txt"] {
        let reply = client.get(path, &[]).await.unwrap();
        assert!(reply.body.contains("<statuscode>999</statuscode>"), "{path}");
    }
}

#[tokio::test]
async fn test_no_route_diagnostics() {
    let gw = spawn_gateway().await;
    let reply = gw
        .anonymous()
        .get("/nowhere", &[("format", "json"), ("probe", "1")])
        .await
        .unwrap();
    let json = reply.json().unwrap();
    assert_eq!(json["statuscode"], 999);
    let message = json["message"].as_str().unwrap();
    assert!(message.starts_with("Invalid query, please check the syntax."));
    assert!(message.contains("http request method: GET"));
    assert!(message.contains("get parameter: probe->1"));
}

#[tokio::test]
async fn test_no_route_diagnostics_can_be_disabled() {
    let gw = spawn_gateway_with(|c| c.ocs.debug_diagnostics = false).await;
    let reply = gw
        .anonymous()
        .get("/nowhere", &[("format", "json"), ("probe", "1")])
        .await
        .unwrap();
    let message = reply.json().unwrap()["message"].as_str().unwrap().to_string();
    assert!(message.ends_with("DEBUG OUTPUT:\n"));
    assert!(!message.contains("probe"));
}

#[tokio::test]
async fn test_person_check() {
    let gw = spawn_gateway().await;
    let client = gw.anonymous();

    let ok = client
        .person_check(Format::Xml, "alice", &password("alice"))
        .await
        .unwrap();
    assert!(ok
        .body
        .contains(r#"<data><person details="check"><personid>alice</personid></person></data>"#));

    let bad = client.person_check(Format::Json, "alice", "wrong").await.unwrap();
    let json = bad.json().unwrap();
    assert_eq!(json["statuscode"], 102);
    assert_eq!(json["message"], "login not valid");

    let empty = client.person_check(Format::Json, "", "x").await.unwrap();
    assert_eq!(empty.json().unwrap()["statuscode"], 101);

    let missing = client.post("/person/check.json", &[("login", "alice")]).await.unwrap();
    assert_eq!(missing.status, 400);
    assert_eq!(missing.body, "Bad request. Please provide a valid password");
}

#[tokio::test]
async fn test_anonymous_forced_auth_gets_challenge() {
    let gw = spawn_gateway().await;
    let reply = gw.anonymous().quota(Format::Xml, "alice").await.unwrap();
    assert_eq!(reply.status, 401);
    assert!(reply.www_authenticate.unwrap().starts_with("Basic"));
    assert!(!reply.body.contains("<ocs>"));

    let wrong = ocs_client::OcsClient::new(&gw.base_url).with_credentials("alice", "nope");
    let reply = wrong.activity(Format::Json, 0, 10).await.unwrap();
    assert_eq!(reply.status, 401);
}

#[tokio::test]
async fn test_activity_publish_and_page() {
    let gw = spawn_gateway().await;
    let alice = gw.client("alice");

    for message in ["first", "second", "third"] {
        let reply = alice.post_activity(Format::Json, message).await.unwrap();
        assert_eq!(reply.json().unwrap()["status"], "ok");
    }

    let json = alice.activity(Format::Json, 0, 2).await.unwrap().json().unwrap();
    assert_eq!(json["totalitems"], 3);
    assert_eq!(json["itemsperpage"], 2);
    let entries = json["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["message"], "third");
    assert_eq!(entries[0]["personid"], "alice");
    assert_eq!(entries[1]["message"], "second");

    let xml = alice.activity(Format::Xml, 1, 2).await.unwrap();
    assert!(xml.body.contains("<totalitems>3</totalitems><itemsperpage>2</itemsperpage>"));
    assert!(xml.body.contains(r#"<activity details="full"><id>"#));
    assert!(xml.body.contains("<message>first</message>"));

    let bob = gw.client("bob").activity(Format::Json, 0, 10).await.unwrap();
    assert_eq!(bob.json().unwrap()["totalitems"], 0);
}

#[tokio::test]
async fn test_activity_page_size_out_of_range_resets() {
    let gw = spawn_gateway().await;
    let json = gw
        .client("alice")
        .activity(Format::Json, 0, 500)
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(json["itemsperpage"], 10);
}

#[tokio::test]
async fn test_private_data_lifecycle() {
    let gw = spawn_gateway().await;
    let alice = gw.client("alice");

    alice
        .set_attribute(Format::Json, "notes", "color", "blue")
        .await
        .unwrap();
    alice
        .set_attribute(Format::Json, "notes", "font", "sans")
        .await
        .unwrap();
    alice
        .set_attribute(Format::Json, "calendar", "view", "week")
        .await
        .unwrap();

    let one = alice
        .get_attribute(Format::Xml, Some("notes"), Some("color"))
        .await
        .unwrap();
    assert!(one.body.contains(
        r#"<data><privatedata details="full"><key>color</key><app>notes</app><value>blue</value></privatedata></data>"#
    ));
    assert!(one.body.contains("<totalitems>1</totalitems>"));
    assert!(!one.body.contains("itemsperpage"));

    let app = alice
        .get_attribute(Format::Json, Some("notes"), None)
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(app["totalitems"], 2);
    assert_eq!(app["itemsperpage"], 0);
    assert_eq!(
        app["data"],
        json!([
            {"key": "color", "app": "notes", "value": "blue"},
            {"key": "font", "app": "notes", "value": "sans"},
        ])
    );

    let all = alice
        .get_attribute(Format::Json, None, None)
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(all["totalitems"], 3);

    let missing = alice
        .get_attribute(Format::Json, Some("notes"), Some("nope"))
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(missing["data"][0]["value"], serde_json::Value::Null);

    let deleted = alice
        .delete_attribute(Format::Json, "notes", "color")
        .await
        .unwrap();
    assert_eq!(deleted.json().unwrap()["status"], "ok");
    let app = alice
        .get_attribute(Format::Json, Some("notes"), None)
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(app["totalitems"], 1);

    let bob = gw
        .client("bob")
        .get_attribute(Format::Json, None, None)
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(bob["totalitems"], 0);
    assert_eq!(bob["data"], json!([]));
}

#[tokio::test]
async fn test_private_data_value_is_required_and_escaped() {
    let gw = spawn_gateway().await;
    let alice = gw.client("alice");

    let reply = alice
        .post("/privatedata/setattribute/notes/color.json", &[])
        .await
        .unwrap();
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body, "Bad request. Please provide a valid value");

    alice
        .set_attribute(Format::Json, "notes", "html", "<b>&</b>")
        .await
        .unwrap();
    let json = alice
        .get_attribute(Format::Json, Some("notes"), Some("html"))
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(json["data"][0]["value"], "&lt;b&gt;&amp;&lt;/b&gt;");
}

#[tokio::test]
async fn test_private_data_delete_needs_app_and_key() {
    let gw = spawn_gateway().await;
    let reply = gw
        .client("alice")
        .delete_attribute(Format::Json, "notes", "<b></b>")
        .await
        .unwrap();
    let json = reply.json().unwrap();
    assert_eq!(json["statuscode"], 101);
    assert_eq!(json["message"], "please specify all mandatory fields");
}

#[tokio::test]
async fn test_quota_for_self_and_admin() {
    let gw = spawn_gateway().await;

    let json = gw
        .client("alice")
        .quota(Format::Json, "alice")
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["totalitems"], 4);
    assert_eq!(json["data"]["quota"], ALICE_QUOTA);
    assert_eq!(json["data"]["used"], ALICE_USED);
    assert_eq!(json["data"]["free"], ALICE_QUOTA - ALICE_USED);
    assert_eq!(json["data"]["relative"].as_f64(), Some(30.0));

    let xml = gw.client("admin").quota(Format::Xml, "alice").await.unwrap();
    assert!(xml.body.contains(
        "<data><quota>1000</quota><free>700</free><used>300</used><relative>30</relative></data>"
    ));
}

#[tokio::test]
async fn test_quota_of_other_user_is_forbidden() {
    let gw = spawn_gateway().await;
    let json = gw
        .client("bob")
        .quota(Format::Json, "alice")
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["statuscode"], 300);
    assert_eq!(json["message"], "You don't have permission to access this resource");
}

#[tokio::test]
async fn test_quota_of_unknown_user() {
    let gw = spawn_gateway().await;
    let json = gw
        .client("admin")
        .quota(Format::Json, "ghost")
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(json["statuscode"], 300);
    assert_eq!(json["message"], "User does not exist");
}

#[tokio::test]
async fn test_set_quota() {
    let gw = spawn_gateway().await;

    let missing = gw
        .client("admin")
        .set_quota(Format::Xml, "alice", None)
        .await
        .unwrap();
    assert_eq!(missing.status, 400);
    assert_eq!(missing.body, "Bad request. Please provide a valid quota");

    let own = gw
        .client("alice")
        .set_quota(Format::Json, "alice", Some(5000))
        .await
        .unwrap();
    assert_eq!(own.json().unwrap()["statuscode"], 300);

    let set = gw
        .client("admin")
        .set_quota(Format::Xml, "alice", Some(2000))
        .await
        .unwrap();
    assert!(set.body.contains("<status>ok</status>"));
    assert!(set.body.contains("<totalitems>0</totalitems>"));
    assert!(set.body.contains("<data></data>"));

    let json = gw
        .client("alice")
        .quota(Format::Json, "alice")
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(json["data"]["quota"], 2000);

    let ghost = gw
        .client("admin")
        .set_quota(Format::Json, "ghost", Some(1))
        .await
        .unwrap();
    assert_eq!(ghost.json().unwrap()["message"], "User does not exist");
}

#[tokio::test]
async fn test_head_is_served_like_get() {
    let gw = spawn_gateway().await;
    let reply = gw
        .anonymous()
        .request(Method::HEAD, "/config.xml")
        .await
        .unwrap();
    assert_eq!(reply.status, 200);
    assert!(reply.body.is_empty());
}
