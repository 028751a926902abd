use anyhow::Result;
use chrono::NaiveDate;
use external_link_report::adapters::file_source::FileSource;
use external_link_report::adapters::outbox::ENVELOPE_FILENAME;
use external_link_report::config::toml_config::ReportConfig;
use external_link_report::{EtlEngine, LinkReportPipeline, LocalStorage, OutboxDispatcher};
use tempfile::TempDir;

fn span(url: &str) -> String {
    format!(r#"<span href="{}">my site</span>"#, url)
}

fn row(title: &str, org: &str, key: &str, html: &str) -> serde_json::Value {
    serde_json::json!({
        "course_title": title,
        "organization": org,
        "h.course_key": key,
        "h.data": html,
    })
}

fn course_rows() -> serde_json::Value {
    serde_json::Value::Array(vec![
        row("course1", "edx", "course-v1:I+am+a+test1", &span("http://www.google.com")),
        row("course1", "edx", "course-v1:I+am+a+test1", &span("http://www.google.com")),
        row("course1", "edx", "course-v1:I+am+a+test1", &span("http://www.facebook.com/")),
        row("course2", "edx", "course-v1:I+am+a+test2", &span("http://www.google2.com/")),
        row("course2", "edx", "course-v1:I+am+a+test2", &span("http://www.google2.com")),
        row("course2", "edx", "course-v1:I+am+a+test2", &span("http://www.google2.com/someextension/")),
        row("course2", "edx", "course-v1:I+am+a+test2", &span("http://www.google2.com/someextension/")),
        row("course3", "edx2", "course-v1:I+am+a+test3", &span("http://www.google3.com")),
        row("course4", "edx2", "course-v1:I+am+a+test4", "I have no urls"),
        row(
            "oldcourse",
            "oldx2",
            "oldx2course:I+am+a+test+for+old+coursekeys",
            &span("http://www.google3.com"),
        ),
        row("course5", "edx", "course-v1:I+am+a+test5", &span("https://courses.edx.org/x")),
        row(
            "course6",
            "edx",
            "course-v1:I+am+a+test6",
            r#"<img src="http://cdn.example.com/banner.PNG">"#,
        ),
    ])
}

fn file_config(rows_path: &str, outbox: &str, on_row_error: &str) -> Result<ReportConfig> {
    let toml_content = format!(
        r#"
[source]
type = "file"
path = "{}"

[email]
from = "enterprise@example.com"

[output]
outbox_path = "{}"

[processing]
on_row_error = "{}"
"#,
        rows_path.replace('\\', "/"),
        outbox.replace('\\', "/"),
        on_row_error
    );
    Ok(ReportConfig::from_toml_str(&toml_content)?)
}

#[tokio::test]
async fn test_end_to_end_report_from_row_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let rows_path = temp_dir.path().join("rows.json");
    tokio::fs::write(&rows_path, course_rows().to_string()).await?;
    let outbox = temp_dir.path().join("outbox");

    let config = file_config(
        rows_path.to_str().unwrap(),
        outbox.to_str().unwrap(),
        "abort",
    )?;
    let storage = LocalStorage::new(config.outbox_path().to_string());
    let pipeline = LinkReportPipeline::new(
        FileSource::new(&rows_path),
        OutboxDispatcher::new(storage.clone()),
        config,
        vec!["success@example.com".to_string()],
    )
    .with_report_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());

    let message_dir = EtlEngine::new(pipeline).run().await?;
    let message_path = storage.full_path(&message_dir);

    let exhaustive = std::fs::read_to_string(
        message_path.join("external-resource-link-report-2024-05-01.csv"),
    )?;
    assert_eq!(
        exhaustive,
        concat!(
            "Course Key,Course Title,Partner,External Links\n",
            "course-v1:I+am+a+test1,\"course1\",edx,http://www.google.com\n",
            ",,,http://www.facebook.com/\n",
            "course-v1:I+am+a+test2,\"course2\",edx,http://www.google2.com/\n",
            ",,,http://www.google2.com\n",
            ",,,http://www.google2.com/someextension/\n",
            "course-v1:I+am+a+test3,\"course3\",edx2,http://www.google3.com\n",
        )
    );

    let aggregate = std::fs::read_to_string(
        message_path.join("external-resource-domain-report-2024-05-01.csv"),
    )?;
    assert_eq!(
        aggregate,
        concat!(
            "Course Key,Course Title,Partner,External Domain,Count\n",
            "course-v1:I+am+a+test1,\"course1\",edx,http://www.google.com/,2\n",
            ",,,http://www.facebook.com/,1\n",
            "course-v1:I+am+a+test2,\"course2\",edx,http://www.google2.com/,4\n",
            "course-v1:I+am+a+test3,\"course3\",edx2,http://www.google3.com/,1\n",
        )
    );

    let envelope: serde_json::Value =
        serde_json::from_slice(&std::fs::read(message_path.join(ENVELOPE_FILENAME))?)?;
    assert_eq!(envelope["subject"], "External Resource Link Report");
    assert_eq!(envelope["from"], "enterprise@example.com");
    assert_eq!(envelope["to"], serde_json::json!(["success@example.com"]));

    Ok(())
}

#[tokio::test]
async fn test_malformed_row_aborts_without_delivery() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let rows_path = temp_dir.path().join("rows.json");
    let rows = serde_json::json!([
        row("course1", "edx", "course-v1:X", &span("http://a.com")),
        {"course_title": "course2", "h.course_key": "course-v1:Y", "h.data": span("http://b.com")}
    ]);
    tokio::fs::write(&rows_path, rows.to_string()).await?;
    let outbox = temp_dir.path().join("outbox");

    let config = file_config(rows_path.to_str().unwrap(), outbox.to_str().unwrap(), "abort")?;
    let storage = LocalStorage::new(config.outbox_path().to_string());
    let pipeline = LinkReportPipeline::new(
        FileSource::new(&rows_path),
        OutboxDispatcher::new(storage),
        config,
        vec!["success@example.com".to_string()],
    );

    let result = EtlEngine::new(pipeline).run().await;

    assert!(result.is_err());
    assert!(!outbox.exists());
    Ok(())
}

#[tokio::test]
async fn test_malformed_row_skipped_with_skip_policy() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let rows_path = temp_dir.path().join("rows.json");
    let rows = serde_json::json!([
        row("course1", "edx", "course-v1:X", &span("http://a.com")),
        {"course_title": "course2", "h.course_key": "course-v1:Y", "h.data": span("http://b.com")},
        row("course3", "edx", "course-v1:Z", &span("http:///no-host")),
    ]);
    tokio::fs::write(&rows_path, rows.to_string()).await?;
    let outbox = temp_dir.path().join("outbox");

    let config = file_config(rows_path.to_str().unwrap(), outbox.to_str().unwrap(), "skip")?;
    let storage = LocalStorage::new(config.outbox_path().to_string());
    let pipeline = LinkReportPipeline::new(
        FileSource::new(&rows_path),
        OutboxDispatcher::new(storage.clone()),
        config,
        vec!["success@example.com".to_string()],
    )
    .with_report_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());

    let message_dir = EtlEngine::new(pipeline).run().await?;
    let message_path = storage.full_path(&message_dir);

    // course3 only has a host-less link, so it is left out of both reports
    let exhaustive = std::fs::read_to_string(
        message_path.join("external-resource-link-report-2024-05-01.csv"),
    )?;
    assert_eq!(
        exhaustive,
        concat!(
            "Course Key,Course Title,Partner,External Links\n",
            "course-v1:X,\"course1\",edx,http://a.com\n",
        )
    );

    let aggregate = std::fs::read_to_string(
        message_path.join("external-resource-domain-report-2024-05-01.csv"),
    )?;

    assert_eq!(
        aggregate,
        concat!(
            "Course Key,Course Title,Partner,External Domain,Count\n",
            "course-v1:X,\"course1\",edx,http://a.com/,1\n",
        )
    );
    Ok(())
}
