use serde_json::json;

use crate::{
    config::{AppendConfig, Settings},
    deploy::local::disk::{Client, Error, Operation},
    job::{AppendError, AppendJob, FILE_PATH_FIELD},
    table::{ParseError, Record},
};

fn records(value: serde_json::Value) -> Vec<Record> {
    serde_json::from_value(value).unwrap()
}

fn settings(yaml: &str) -> Settings {
    serde_yaml::from_str::<AppendConfig>(yaml)
        .unwrap()
        .compile()
        .unwrap()
}

async fn content(disk: &Client, settings: &Settings) -> String {
    let file = disk.file(&settings.path).await.unwrap();
    String::from_utf8(file.body.to_vec()).unwrap()
}

#[tokio::test]
async fn create_with_header_from_first_record() {
    let settings = settings("filePath: /t.csv");
    let disk = Client::new();
    let output = AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "a": 1, "b": 2 }, { "a": 3, "b": 4 }])))
    .await
    .unwrap();

    assert_eq!(content(&disk, &settings).await, "a,b\n1,2\n3,4\n");
    assert_eq!(
        disk.file(&settings.path).await.unwrap().content_type,
        "text/csv; charset=UTF-8"
    );
    assert_eq!(
        disk.calls().await,
        [Operation::DownloadLink, Operation::UploadLink, Operation::Upload]
    );
    assert_eq!(
        output,
        records(json!([
            { "a": 1, "b": 2, FILE_PATH_FIELD: "disk:/t.csv" },
            { "a": 3, "b": 4, FILE_PATH_FIELD: "disk:/t.csv" },
        ]))
    );
}

#[tokio::test]
async fn create_without_header() {
    let settings = settings("{filePath: /t.csv, writeHeaderOnCreate: false}");
    let disk = Client::new();
    AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "a": 1, "b": 2 }, { "a": 3, "b": 4 }])))
    .await
    .unwrap();
    assert_eq!(content(&disk, &settings).await, "1,2\n3,4\n");
}

#[tokio::test]
async fn append_does_not_repeat_header() {
    let settings = settings("filePath: /t.csv");
    let disk = Client::new();
    disk.insert(&settings.path, "a,b\nx,y\n").await;
    AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "a": 9, "b": 8 }])))
    .await
    .unwrap();

    assert_eq!(content(&disk, &settings).await, "a,b\nx,y\n9,8\n");
    assert_eq!(
        disk.calls().await,
        [
            Operation::DownloadLink,
            Operation::Download,
            Operation::UploadLink,
            Operation::Upload
        ]
    );
}

#[tokio::test]
async fn append_terminates_last_line() {
    let settings = settings("filePath: /t.csv");
    let disk = Client::new();
    disk.insert(&settings.path, "a,b\nx,y").await;
    AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "a": 9, "b": 8 }])))
    .await
    .unwrap();
    assert_eq!(content(&disk, &settings).await, "a,b\nx,y\n9,8\n");
}

#[tokio::test]
async fn existing_header_governs_layout() {
    let settings = settings("filePath: /t.csv");
    let disk = Client::new();
    disk.insert(&settings.path, "a,b\n").await;
    AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "b": 2, "a": 1 }, { "a": 1, "c": 5 }])))
    .await
    .unwrap();
    assert_eq!(content(&disk, &settings).await, "a,b\n1,2\n1,\n");
}

#[tokio::test]
async fn explicit_columns_ignore_existing_header() {
    let settings = settings("{filePath: /t.csv, mappingMode: byColumns, columns: 'b,a'}");
    let disk = Client::new();
    disk.insert(&settings.path, "a,b\n").await;
    AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "a": 1, "b": 2 }])))
    .await
    .unwrap();
    assert_eq!(content(&disk, &settings).await, "a,b\n2,1\n");
}

#[tokio::test]
async fn explicit_columns_become_header_on_create() {
    let settings = settings("{filePath: /t.csv, mappingMode: byColumns, columns: 'b,a'}");
    let disk = Client::new();
    AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "a": 1, "b": 2 }])))
    .await
    .unwrap();
    assert_eq!(content(&disk, &settings).await, "b,a\n2,1\n");
}

#[tokio::test]
async fn empty_existing_file_gets_no_header() {
    let settings = settings("filePath: /t.csv");
    let disk = Client::new();
    disk.insert(&settings.path, "").await;
    AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "a": 1, "b": 2 }])))
    .await
    .unwrap();
    assert_eq!(content(&disk, &settings).await, "1,2\n");
}

#[tokio::test]
async fn missing_file_without_create_aborts() {
    let settings = settings("{filePath: /t.csv, createIfMissing: false}");
    let disk = Client::new();
    let result = AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "a": 1 }])))
    .await;

    assert!(matches!(result, Err(AppendError::NotFound(path)) if path == settings.path));
    assert_eq!(disk.calls().await, [Operation::DownloadLink]);
    assert!(disk.file(&settings.path).await.is_none());
}

#[tokio::test]
async fn fetch_failure_aborts_before_upload() {
    let settings = settings("filePath: /t.csv");
    let disk = Client::new();
    disk.insert(&settings.path, "a\n1\n").await;
    disk.fail(Operation::Download, 500).await;
    let result = AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "a": 2 }])))
    .await;

    assert!(matches!(
        result,
        Err(AppendError::Storage(Error::Status { status: 500, .. }))
    ));
    assert_eq!(
        disk.calls().await,
        [Operation::DownloadLink, Operation::Download]
    );
    assert_eq!(content(&disk, &settings).await, "a\n1\n");
}

#[tokio::test]
async fn upload_link_failure_leaves_file_unchanged() {
    let settings = settings("filePath: /t.csv");
    let disk = Client::new();
    disk.insert(&settings.path, "a\n1\n").await;
    disk.fail(Operation::UploadLink, 503).await;
    let result = AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "a": 2 }])))
    .await;

    assert!(matches!(
        result,
        Err(AppendError::Storage(Error::Status {
            operation: Operation::UploadLink,
            status: 503
        }))
    ));
    assert_eq!(content(&disk, &settings).await, "a\n1\n");
}

#[tokio::test]
async fn malformed_header_aborts() {
    let settings = settings("filePath: /t.csv");
    let disk = Client::new();
    disk.insert(&settings.path, "\nx,y\n").await;
    let result = AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "a": 2 }])))
    .await;

    assert!(matches!(result, Err(AppendError::MalformedHeader(_))));
    assert!(!disk.calls().await.contains(&Operation::Upload));
}

#[tokio::test]
async fn unterminated_header_quote_aborts() {
    let settings = settings("filePath: /t.csv");
    let disk = Client::new();
    disk.insert(&settings.path, "\"a,b\nx,y\n").await;
    let result = AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "a": 2, "b": 3 }])))
    .await;

    assert!(matches!(
        result,
        Err(AppendError::MalformedHeader(ParseError::UnterminatedQuote))
    ));
    assert_eq!(
        disk.calls().await,
        [Operation::DownloadLink, Operation::Download]
    );
    assert_eq!(content(&disk, &settings).await, "\"a,b\nx,y\n");
}

#[tokio::test]
async fn download_link_failure_aborts() {
    let settings = settings("filePath: /t.csv");
    let disk = Client::new();
    disk.insert(&settings.path, "a\n1\n").await;
    disk.fail(Operation::DownloadLink, 500).await;
    let error = AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "a": 2 }])))
    .await
    .unwrap_err();

    assert!(matches!(
        error,
        AppendError::Storage(Error::Status {
            operation: Operation::DownloadLink,
            status: 500
        })
    ));
    let source = std::error::Error::source(&error).unwrap();
    assert!(source.downcast_ref::<Error>().is_some());
    assert_eq!(disk.calls().await, [Operation::DownloadLink]);
    assert_eq!(content(&disk, &settings).await, "a\n1\n");
}

#[tokio::test]
async fn upload_failure_leaves_file_unchanged() {
    let settings = settings("filePath: /t.csv");
    let disk = Client::new();
    disk.insert(&settings.path, "a\n1\n").await;
    disk.fail(Operation::Upload, 500).await;
    let result = AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "a": 2 }])))
    .await;

    assert!(matches!(
        result,
        Err(AppendError::Storage(Error::Status {
            operation: Operation::Upload,
            status: 500
        }))
    ));
    assert_eq!(
        disk.calls().await,
        [
            Operation::DownloadLink,
            Operation::Download,
            Operation::UploadLink,
            Operation::Upload
        ]
    );
    assert_eq!(content(&disk, &settings).await, "a\n1\n");
}

#[tokio::test]
async fn first_record_without_fields_is_rejected() {
    let settings = settings("filePath: /t.csv");
    let disk = Client::new();
    let result = AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{}, { "a": 1 }])))
    .await;

    assert!(matches!(result, Err(AppendError::EmptyLayout)));
    assert!(!disk.calls().await.contains(&Operation::UploadLink));
    assert!(disk.file(&settings.path).await.is_none());
}

#[tokio::test]
async fn no_records_no_calls() {
    let settings = settings("filePath: /t.csv");
    let disk = Client::new();
    let output = AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(Vec::new())
    .await
    .unwrap();
    assert!(output.is_empty());
    assert!(disk.calls().await.is_empty());
}

#[tokio::test]
async fn legacy_encoding_round_trip() {
    let settings = AppendConfig::load("src/tests/fixtures/semicolon.yaml")
        .await
        .unwrap()
        .compile()
        .unwrap();
    let encoding = settings.encoding;
    let (existing, _, _) = encoding.encode("city;visits\nМосква;10\n");
    let disk = Client::new();
    disk.insert(&settings.path, existing.into_owned()).await;

    AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "visits": 3, "city": "Казань" }])))
    .await
    .unwrap();

    let file = disk.file(&settings.path).await.unwrap();
    let (expected, _, _) = encoding.encode("city;visits\nМосква;10\nКазань;3\n");
    assert_eq!(file.body.as_ref(), expected.as_ref());
    assert_eq!(file.content_type, "text/csv; charset=windows-1251");
}

#[tokio::test]
async fn toml_config_with_tab_delimiter() {
    let settings = AppendConfig::load("src/tests/fixtures/by_header.toml")
        .await
        .unwrap()
        .compile()
        .unwrap();
    let disk = Client::new();
    let output = AppendJob {
        disk: &disk,
        settings: &settings,
    }
    .run(records(json!([{ "id": 1, "name": "x y" }, { "name": null, "id": 2 }])))
    .await
    .unwrap();

    assert_eq!(content(&disk, &settings).await, "id\tname\n1\tx y\n2\t\n");
    assert_eq!(output[1][FILE_PATH_FIELD], "disk:/reports/orders.csv");
}
