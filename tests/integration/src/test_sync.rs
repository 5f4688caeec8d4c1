//! Bucket deployment integration tests.

#[cfg(test)]
mod tests {
    use photostack_stack::topology::exports;
    use photostack_web::{SiteBundle, SiteConfig};
    use reqwest::StatusCode;

    use crate::{TestStack, http_client};

    #[tokio::test]
    async fn test_should_not_reupload_unchanged_deployments() {
        let stack = TestStack::spawn(&[("a.jpg", b"a")]).await.unwrap();

        let reports = stack
            .stack
            .deployment_manifest(&stack.deployed)
            .unwrap()
            .apply(stack.cloud.store())
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.is_noop()));
    }

    #[tokio::test]
    async fn test_should_serve_rebuilt_site_bundle() {
        let stack = TestStack::spawn(&[("a.jpg", b"a")]).await.unwrap();
        let api = stack.output(exports::API_ENDPOINT).unwrap().to_owned();

        SiteBundle::build(&SiteConfig::new(api.clone()), &stack.cloud.config().site_dir).unwrap();
        let reports = stack
            .stack
            .deployment_manifest(&stack.deployed)
            .unwrap()
            .apply(stack.cloud.store())
            .unwrap();
        let uploaded: Vec<&str> = reports
            .iter()
            .flat_map(|r| r.uploaded.iter().map(String::as_str))
            .collect();
        assert!(uploaded.contains(&"index.html"));
        assert!(uploaded.contains(&"app.js"));

        let site = stack.output(exports::WEBSITE_URL).unwrap();
        let resp = http_client().get(site).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.text().await.unwrap().contains(&api));

        let resp = http_client()
            .get(format!("{site}app.js"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_should_remove_deleted_photos_on_resync() {
        let stack = TestStack::spawn(&[("a.jpg", b"a"), ("b.jpg", b"b")])
            .await
            .unwrap();
        std::fs::remove_file(stack.cloud.config().photos_dir.join("b.jpg")).unwrap();

        let reports = stack
            .stack
            .deployment_manifest(&stack.deployed)
            .unwrap()
            .apply(stack.cloud.store())
            .unwrap();
        assert!(reports.iter().any(|r| r.deleted == ["b.jpg"]));

        let body: serde_json::Value = http_client()
            .get(stack.photos_url().unwrap())
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["filename"], "a.jpg");
    }
}
