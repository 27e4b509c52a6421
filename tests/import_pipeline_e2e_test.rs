// ==========================================
// 导入管道端到端测试
// ==========================================
// 文件解析 → 列映射 → 行转换 → 批量提交 → 结果展示

use lead_importer::domain::{FieldKey, ImportResult, LeadValue, MappingTarget, RowError};
use lead_importer::importer::{
    guess_mapping, BatchCommitter, ImportError, ImportReport, ImportSession, RowTransformer,
    SessionPhase, TransportFailure, UniversalFileParser,
};
use serde_json::json;

use test_helpers::{fixture, test_meta, write_temp_file, MockImportClient};

/// 场景 1: 典型 CRM 导出文件
#[tokio::test]
async fn test_csv_to_payload_full_flow() {
    println!("\n=== 测试 CSV 导入完整流程 ===\n");

    let csv = b"First Name,Last Name,Phone,Budget Max\n\
Jane,Doe,5551234567,\"$600,000\"\n\
John,Smith,5550000000,700k\n\
Ana,Lopez,,\n";
    let (_dir, path) = write_temp_file("leads.csv", csv);

    // 步骤 1: 解析
    let table = UniversalFileParser::default().parse(&path).unwrap();
    assert_eq!(table.headers(), &["First Name", "Last Name", "Phone", "Budget Max"]);
    assert_eq!(table.row_count(), 3);
    println!("✓ 步骤 1: 文件已解析, {} 行", table.row_count());

    // 步骤 2: 映射
    let mapping = guess_mapping(table.headers());
    assert_eq!(mapping.get("Budget Max"), Some(MappingTarget::Field(FieldKey::PriceMax)));
    println!("✓ 步骤 2: 已映射 {} 列", mapping.mapped_count());

    // 步骤 3: 转换（行序与文件一致）
    let rows = RowTransformer::default().transform(table.rows(), &mapping, None);
    assert_eq!(
        serde_json::to_value(&rows).unwrap(),
        json!([
            {
                "first_name": "Jane",
                "last_name": "Doe",
                "phone": "5551234567",
                "price_max": 600000
            },
            {
                "first_name": "John",
                "last_name": "Smith",
                "phone": "5550000000",
                "price_max": 700
            },
            {
                "first_name": "Ana",
                "last_name": "Lopez"
            }
        ])
    );
    println!("✓ 步骤 3: 行转换完成");

    // 步骤 4: 提交
    let committer = BatchCommitter::new(MockImportClient::new());
    let result = committer.commit(&rows, &test_meta()).await.unwrap();
    assert_eq!(result.inserted, 3);

    let requests = committer.client().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["user_id"], "agent-1");
    assert_eq!(requests[0]["default_stage"], "New");
    assert_eq!(requests[0]["in_dashboard"], true);
    let first_names: Vec<&str> = requests[0]["leads"]
        .as_array()
        .unwrap()
        .iter()
        .map(|lead| lead["first_name"].as_str().unwrap())
        .collect();
    assert_eq!(first_names, vec!["Jane", "John", "Ana"]);
    assert_eq!(requests[0]["leads"][0]["price_max"], 600000);
    println!("✓ 步骤 4: 单次请求提交完成");
}

/// 场景 2: 空单元格不出现在结果中
#[test]
fn test_empty_cells_are_omitted() {
    let csv = b"First Name,Email,Notes\nJane,,Called twice\n";
    let table = UniversalFileParser::default()
        .parse_bytes("leads.csv", csv)
        .unwrap();
    let mapping = guess_mapping(table.headers());
    let rows = RowTransformer::default().transform(table.rows(), &mapping, None);

    assert!(!rows[0].contains(FieldKey::Email));
    assert_eq!(rows[0].get(FieldKey::Notes), Some(&LeadValue::from("Called twice")));
}

/// 场景 3: 部分成功的结果展示
#[tokio::test]
async fn test_partial_success_report() {
    let client = MockImportClient::new().respond(Ok(ImportResult {
        inserted: 2,
        skipped: 1,
        errors: vec![RowError {
            row: 3,
            reason: "invalid email".to_string(),
        }],
        inserted_leads: vec![],
    }));

    let mut session = ImportSession::default();
    session
        .choose_bytes(
            "leads.csv",
            b"First Name,Email\nA,a@example.com\nB,b@example.com\nC,not-an-email\n",
        )
        .unwrap();

    let committer = BatchCommitter::new(client);
    let result = session.commit(&committer, &test_meta()).await.unwrap();
    let report = ImportReport::from_result(&result, 10);

    assert_eq!(report.summary, "Imported 2 • Skipped 1");
    assert_eq!(report.error_lines, vec!["Row 3: invalid email"]);
    assert_eq!(report.more, None);
}

/// 场景 4: 不支持的扩展名在映射前即被拒绝
#[test]
fn test_unsupported_extension_rejected_before_mapping() {
    let (_dir, path) = write_temp_file("leads.unsupportedext", b"First Name\nJane\n");
    let mut session = ImportSession::default();

    let result = session.choose_file(&path);
    assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    assert_eq!(session.phase(), SessionPhase::Choose);
    assert!(session.mapping().is_empty());
}

#[test]
fn test_xlsx_fixture_flow() {
    let mut session = ImportSession::default();
    session.choose_file(fixture("leads.xlsx")).unwrap();

    let table = session.table().unwrap();
    assert_eq!(
        table.headers(),
        &["First Name", "Last Name", "E-mail", "Price Min", "Price Max", "Tags"]
    );
    // 空白行被跳过
    assert_eq!(table.row_count(), 2);

    let rows = session.transformed_rows();
    assert_eq!(rows[0].get(FieldKey::Email), Some(&LeadValue::from("jane@example.com")));
    assert_eq!(rows[0].get(FieldKey::PriceMin), Some(&LeadValue::Integer(450000)));
    assert_eq!(
        rows[0].get(FieldKey::SourceTags),
        Some(&LeadValue::List(vec![
            "Website".to_string(),
            "Open House".to_string()
        ]))
    );

    assert!(!rows[1].contains(FieldKey::PriceMin));
    assert_eq!(rows[1].get(FieldKey::PriceMax), Some(&LeadValue::Integer(700000)));
}

#[test]
fn test_reingest_is_deterministic() {
    let csv = b"Name,Cell,Zip Code,Lead Source\nJane Doe,555,90210,\"Website, Lead Generator AI, \"\n";
    let parser = UniversalFileParser::default();

    let first = parser.parse_bytes("a.csv", csv).unwrap();
    let second = parser.parse_bytes("a.csv", csv).unwrap();
    assert_eq!(first, second);
    assert_eq!(guess_mapping(first.headers()), guess_mapping(second.headers()));

    let rows = RowTransformer::default().transform(first.rows(), &guess_mapping(first.headers()), None);
    assert_eq!(
        rows[0].get(FieldKey::SourceTags),
        Some(&LeadValue::List(vec![
            "Website".to_string(),
            "Lead Generator AI".to_string()
        ]))
    );
    assert!(!rows[0].contains(FieldKey::FirstName));
}

#[tokio::test]
async fn test_transport_failure_keeps_session_open() {
    let client = MockImportClient::new().respond(Err(TransportFailure::Http {
        status: 422,
        body: r#"{"detail":[{"loc":["body","leads",0,"email"],"msg":"value is not a valid email address"}]}"#
            .to_string(),
    }));
    let committer = BatchCommitter::new(client);

    let mut session = ImportSession::default();
    session
        .choose_bytes("leads.csv", b"First Name,Email\nJane,bad\n")
        .unwrap();

    let err = session.commit(&committer, &test_meta()).await.unwrap_err();
    assert_eq!(err.to_string(), "leads.0.email: value is not a valid email address");
    assert!(err.is_retryable());
    assert_eq!(session.phase(), SessionPhase::Result);

    // 修改映射后重试,第二次使用默认成功响应
    session.set_mapping("Email", MappingTarget::Skip).unwrap();
    let result = session.commit(&committer, &test_meta()).await.unwrap();
    assert_eq!(result.inserted, 1);

    let requests = committer.client().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1]["leads"][0], json!({"first_name": "Jane"}));
}

#[tokio::test]
async fn test_chunked_commit_aggregates_results() {
    let mut csv = String::from("First Name\n");
    for i in 0..5 {
        csv.push_str(&format!("Lead{}\n", i));
    }

    let client = MockImportClient::new()
        .respond(Ok(ImportResult {
            inserted: 2,
            skipped: 0,
            errors: vec![],
            inserted_leads: vec![json!({"id": 1}), json!({"id": 2})],
        }))
        .respond(Ok(ImportResult {
            inserted: 1,
            skipped: 1,
            errors: vec![RowError {
                row: 1,
                reason: "duplicate".to_string(),
            }],
            inserted_leads: vec![json!({"id": 3})],
        }));
    let committer = BatchCommitter::new(client).with_chunk_size(Some(2));

    let mut session = ImportSession::default();
    session.choose_bytes("leads.csv", csv.as_bytes()).unwrap();
    let result = session.commit(&committer, &test_meta()).await.unwrap();

    let requests = committer.client().requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2]["leads"], json!([{"first_name": "Lead4"}]));

    // 3 个块: 2 + 1 + 1(默认成功)
    assert_eq!(result.inserted, 4);
    assert_eq!(result.skipped, 1);
    assert_eq!(result.errors[0].row, 3);
    assert_eq!(result.inserted_leads.len(), 3);
}

#[tokio::test]
async fn test_empty_file_is_not_sent() {
    let committer = BatchCommitter::new(MockImportClient::new());
    let mut session = ImportSession::default();
    session.choose_bytes("leads.csv", b"First Name,Email\n").unwrap();

    let result = session.commit(&committer, &test_meta()).await;
    assert!(matches!(result, Err(ImportError::EmptyBatch)));
    assert!(committer.client().requests().is_empty());
}
