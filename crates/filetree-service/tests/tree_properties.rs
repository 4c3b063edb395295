//! End-to-end tree behaviour through the explorer facade.

use std::sync::Arc;

use filetree_core::ErrorKind;
use filetree_core::config::TreeConfig;
use filetree_database::{CascadeMode, ItemStore, MemoryItemStore};
use filetree_entity::item::{Item, ItemKind};
use filetree_service::{ExplorerService, RequestContext};

struct Fixture {
    memory: MemoryItemStore,
    explorer: ExplorerService,
    ctx: RequestContext,
}

impl Fixture {
    fn new() -> Self {
        Self::with_store(MemoryItemStore::new())
    }

    fn with_store(memory: MemoryItemStore) -> Self {
        let shared: Arc<dyn ItemStore> = Arc::new(memory.clone());
        Self {
            memory,
            explorer: ExplorerService::new(shared, &TreeConfig::default()),
            ctx: RequestContext::new("integration-test"),
        }
    }

    async fn folder(&self, name: &str, parent: Option<&Item>) -> Item {
        self.explorer
            .create_item(&self.ctx, name, ItemKind::Folder, parent.map(|p| p.id), None)
            .await
            .unwrap()
    }

    async fn file(&self, name: &str, parent: Option<&Item>, size: u64) -> Item {
        self.explorer
            .create_item(&self.ctx, name, ItemKind::File, parent.map(|p| p.id), Some(size))
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn docs_scenario_sizes_and_duplicate() {
    let fx = Fixture::new();
    let docs = fx.folder("Docs", None).await;
    fx.file("Relatorio.pdf", Some(&docs), 1000).await;
    fx.file("Foto.png", Some(&docs), 500).await;

    let root = fx.explorer.list_items(None, None).await.unwrap();
    assert_eq!(root.len(), 1);
    assert_eq!(root[0].name, "Docs");
    assert_eq!(root[0].kind, ItemKind::Folder);
    assert_eq!(root[0].size, 1500);

    let err = fx
        .explorer
        .create_item(&fx.ctx, "Foto.png", ItemKind::File, Some(docs.id), Some(500))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateName);

    let root = fx.explorer.list_items(None, None).await.unwrap();
    assert_eq!(root[0].size, 1500);

    let fotos = fx
        .memory
        .list_by_parent(Some(docs.id))
        .await
        .unwrap()
        .into_iter()
        .filter(|item| item.name == "Foto.png")
        .count();
    assert_eq!(fotos, 1);
}

#[tokio::test]
async fn folder_size_equals_sum_of_children() {
    let fx = Fixture::new();
    let top = fx.folder("top", None).await;
    let left = fx.folder("left", Some(&top)).await;
    let right = fx.folder("right", Some(&top)).await;
    fx.folder("empty", Some(&top)).await;
    fx.file("a", Some(&left), 10).await;
    fx.file("b", Some(&left), 20).await;
    fx.file("c", Some(&right), 30).await;
    fx.file("d", Some(&top), 40).await;

    let children = fx.explorer.list_items(Some(top.id), None).await.unwrap();
    let sum: u64 = children.iter().map(|c| c.size).sum();
    let top_view = fx.explorer.get_item(top.id).await.unwrap();

    assert_eq!(top_view.size, sum);
    assert_eq!(sum, 100);
    let empty = children.iter().find(|c| c.name == "empty").unwrap();
    assert_eq!(empty.size, 0);
}

#[tokio::test]
async fn search_ignores_parents_and_case() {
    let fx = Fixture::new();
    let docs = fx.folder("Docs", None).await;
    let images = fx.folder("Images", None).await;
    fx.file("Invoice2023.pdf", Some(&docs), 100).await;
    fx.file("Invoice_scan.png", Some(&images), 200).await;
    fx.file("holiday.png", Some(&images), 300).await;

    let hits = fx
        .explorer
        .list_items(None, Some("invoice"))
        .await
        .unwrap();
    let names: Vec<_> = hits.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, ["Invoice2023.pdf", "Invoice_scan.png"]);
    assert_ne!(hits[0].parent_id, hits[1].parent_id);

    // A query takes precedence over the parent scope.
    let scoped = fx
        .explorer
        .list_items(Some(docs.id), Some("INVOICE"))
        .await
        .unwrap();
    assert_eq!(scoped.len(), 2);
}

#[tokio::test]
async fn cascade_delete_removes_every_descendant() {
    for mode in [CascadeMode::Native, CascadeMode::Explicit] {
        let fx = Fixture::with_store(MemoryItemStore::new().with_cascade_mode(mode));
        let root = fx.folder("root", None).await;
        let mid = fx.folder("mid", Some(&root)).await;
        let deep = fx.folder("deep", Some(&mid)).await;
        let leaf = fx.file("leaf", Some(&deep), 1).await;
        let side = fx.file("side", Some(&root), 1).await;
        let survivor = fx.file("survivor", None, 1).await;

        let removed = fx.explorer.delete_item(&fx.ctx, root.id).await.unwrap();
        assert_eq!(removed, 5, "{mode:?}");

        for id in [root.id, mid.id, deep.id, leaf.id, side.id] {
            assert!(fx.memory.get(id).await.unwrap().is_none(), "{mode:?}");
            let err = fx.explorer.get_item(id).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::NotFound);
        }
        assert!(fx.memory.get(survivor.id).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn breadcrumbs_follow_the_parent_chain() {
    let fx = Fixture::new();
    assert!(fx.explorer.get_breadcrumbs(None).await.unwrap().is_empty());

    let docs = fx.folder("Docs", None).await;
    let year = fx.folder("2023", Some(&docs)).await;
    let report = fx.file("report.pdf", Some(&year), 5).await;

    let single = fx.explorer.get_breadcrumbs(Some(docs.id)).await.unwrap();
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].id, docs.id);

    let trail: Vec<_> = fx
        .explorer
        .get_breadcrumbs(Some(report.id))
        .await
        .unwrap()
        .into_iter()
        .map(|crumb| crumb.name)
        .collect();
    assert_eq!(trail, ["Docs", "2023", "report.pdf"]);
}

#[tokio::test]
async fn moving_a_folder_into_its_descendant_fails() {
    let fx = Fixture::new();
    let a = fx.folder("A", None).await;
    let b = fx.folder("B", Some(&a)).await;
    let c = fx.folder("C", Some(&b)).await;

    let err = fx
        .explorer
        .move_item(&fx.ctx, a.id, Some(c.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::WouldCreateCycle);

    let targets: Vec<_> = fx
        .explorer
        .list_move_targets(a.id)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert!(targets.is_empty());

    let moved = fx.explorer.move_item(&fx.ctx, c.id, None).await.unwrap();
    assert!(moved.is_root());
    let trail = fx.explorer.get_breadcrumbs(Some(c.id)).await.unwrap();
    assert_eq!(trail.len(), 1);
}

#[tokio::test]
async fn move_updates_sizes_on_both_sides() {
    let fx = Fixture::new();
    let from = fx.folder("from", None).await;
    let to = fx.folder("to", None).await;
    let payload = fx.file("payload.bin", Some(&from), 64).await;

    fx.explorer
        .move_item(&fx.ctx, payload.id, Some(to.id))
        .await
        .unwrap();

    assert_eq!(fx.explorer.get_item(from.id).await.unwrap().size, 0);
    assert_eq!(fx.explorer.get_item(to.id).await.unwrap().size, 64);

    let folders: Vec<_> = fx
        .explorer
        .list_folders()
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(folders, ["from", "to"]);
}

#[tokio::test]
async fn concurrent_duplicate_creates_leave_one_record() {
    let fx = Fixture::new();
    let docs = fx.folder("Docs", None).await;

    let attempts = (0..8).map(|_| {
        fx.explorer
            .create_item(&fx.ctx, "race.txt", ItemKind::File, Some(docs.id), Some(1))
    });
    let results = futures::future::join_all(attempts).await;

    let created = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(created, 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind == ErrorKind::DuplicateName)
    );
    assert_eq!(fx.memory.list_by_parent(Some(docs.id)).await.unwrap().len(), 1);
}
