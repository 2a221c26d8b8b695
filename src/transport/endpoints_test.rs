use super::*;
use crate::ErrorKind;
use crate::OptionField;

fn endpoint<'a>(host: &'a str) -> ConfigEndpoint<'a> {
    ConfigEndpoint {
        host,
        app_id: "SampleApp",
        cluster: "default",
        namespace: "application",
        ip: None,
        data_center: None,
    }
}

#[test]
fn test_query_config_without_params() {
    let url = query_config(&endpoint("http://localhost:8080"), None).unwrap();
    assert_eq!(url, "http://localhost:8080/configs/SampleApp/default/application");
}

#[test]
fn test_query_config_with_all_params() {
    let ep = ConfigEndpoint {
        ip: Some("10.0.0.1"),
        data_center: Some("dc-1"),
        ..endpoint("http://localhost:8080")
    };

    let url = query_config(&ep, Some("20240101-abc")).unwrap();
    assert_eq!(
        url,
        "http://localhost:8080/configs/SampleApp/default/application?releaseKey=20240101-abc&ip=10.0.0.1&dataCenter=dc-1"
    );
}

#[test]
fn test_query_config_keeps_host_path_prefix() {
    let url = query_config(&endpoint("http://localhost:8080/apollo"), None).unwrap();
    assert_eq!(url, "http://localhost:8080/apollo/configs/SampleApp/default/application");

    let url = query_config(&endpoint("http://localhost:8080/apollo/"), None).unwrap();
    assert_eq!(url, "http://localhost:8080/apollo/configs/SampleApp/default/application");
}

#[test]
fn test_query_config_as_json_path() {
    let ep = ConfigEndpoint {
        namespace: "app.json",
        ip: Some("10.0.0.1"),
        ..endpoint("http://localhost:8080")
    };

    let url = query_config_as_json(&ep).unwrap();
    assert_eq!(
        url,
        "http://localhost:8080/configfiles/json/SampleApp/default/app.json?ip=10.0.0.1"
    );
}

#[test]
fn test_query_update_encodes_notifications() {
    let notifications = r#"[{"namespaceName":"application","notificationId":5}]"#;
    let url = query_update("http://localhost:8080", "SampleApp", "default", notifications).unwrap();

    let parsed = reqwest::Url::parse(&url).unwrap();
    assert_eq!(parsed.path(), "/notifications/v2");
    let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    assert_eq!(
        pairs,
        vec![
            ("appId".to_string(), "SampleApp".to_string()),
            ("cluster".to_string(), "default".to_string()),
            ("notifications".to_string(), notifications.to_string()),
        ]
    );
    assert!(!url.contains('{'));
}

#[test]
fn test_invalid_host_rejected() {
    let e = query_config(&endpoint("not a url"), None).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Invalid(OptionField::Host));
}
