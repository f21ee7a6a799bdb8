//! Form controller against a live intake service backed by memory storage

use denuncia_form::{Attachment, IntakeClient, Step, TipoDenuncia, Wizard};
use intake_service::{create_router, AppState, Limits, MemoryStore};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Serve the intake router on an ephemeral port
async fn spawn_service(store: Option<Arc<MemoryStore>>) -> String {
    let state = AppState::new(
        store.map(|s| s as Arc<dyn intake_service::ObjectStore>),
        Limits::default(),
    );
    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn ready_to_confirm() -> Wizard {
    Wizard::new()
        .edit(|d| d.email("ana@empresa.cl").telefono("912345678"))
        .unwrap()
        .next()
        .unwrap()
        .edit(|d| d.tipo_denuncia(TipoDenuncia::Medioambiente))
        .unwrap()
        .next()
        .unwrap()
        .edit(|d| {
            d.detalle("Descarga de residuos al estero por la noche")
                .ubicacion("Planta Norte")
                .archivo(Attachment::new("registro.PDF", "application/pdf", b"%PDF-1.4".to_vec()))
                .archivo(Attachment::new("foto.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF]))
        })
        .unwrap()
        .next()
        .unwrap()
}

#[tokio::test]
async fn test_submission_is_stored() {
    let store = Arc::new(MemoryStore::new());
    let base_url = spawn_service(Some(store.clone())).await;

    let wizard = ready_to_confirm()
        .submit_with(&IntakeClient::new(&base_url))
        .await
        .unwrap();

    let tracking_id = wizard.tracking_id().expect("tracking id").clone();
    let prefix = format!("medioambiente/{}/", tracking_id);

    let pdf = store
        .get(&format!("{}adjunto-1.pdf", prefix))
        .await
        .expect("first attachment");
    assert_eq!(pdf.bytes.as_ref(), b"%PDF-1.4");
    assert_eq!(pdf.content_type, "application/pdf");

    let jpg = store
        .get(&format!("{}adjunto-2.jpg", prefix))
        .await
        .expect("second attachment");
    assert_eq!(jpg.content_type, "image/jpeg");

    let metadata = store
        .get(&format!("{}metadata.json", prefix))
        .await
        .expect("metadata");
    let record: serde_json::Value = serde_json::from_slice(&metadata.bytes).unwrap();
    assert_eq!(record["trackingId"], tracking_id.as_str());
    assert_eq!(record["tipoDenuncia"], "medioambiente");
    assert_eq!(record["email"], "ana@empresa.cl");
    assert_eq!(record["adjuntos"].as_array().unwrap().len(), 2);
    assert_eq!(record["adjuntos"][0]["originalName"], "registro.PDF");

    // Success clears the form
    assert_eq!(wizard.start_over().unwrap(), Wizard::new());
}

#[tokio::test]
async fn test_unconfigured_storage_returns_to_detail() {
    let base_url = spawn_service(None).await;

    let wizard = ready_to_confirm();
    let draft = wizard.draft().clone();

    let wizard = wizard
        .submit_with(&IntakeClient::new(&base_url))
        .await
        .unwrap();

    match wizard.step() {
        Step::Failure { message } => assert!(message.contains("500")),
        other => panic!("unexpected step: {:?}", other),
    }

    let wizard = wizard.dismiss().unwrap();
    assert_eq!(*wizard.step(), Step::Detail);
    assert_eq!(*wizard.draft(), draft);
}

#[tokio::test]
async fn test_unreachable_service_is_a_failure() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let wizard = ready_to_confirm()
        .submit_with(&IntakeClient::new(&format!("http://{}", addr)))
        .await
        .unwrap();

    assert!(matches!(wizard.step(), Step::Failure { .. }));
    assert!(wizard.tracking_id().is_none());
}
