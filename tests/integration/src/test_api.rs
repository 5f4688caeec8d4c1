//! Photo listing API integration tests.

#[cfg(test)]
mod tests {
    use photostack_core::PhotoRecord;
    use reqwest::StatusCode;
    use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};

    use crate::{TestStack, http_client};

    #[tokio::test]
    async fn test_should_list_photos_with_fetchable_urls() {
        let stack = TestStack::spawn(&[("a.jpg", b"jpeg-a"), ("2024/b.png", b"png-b")])
            .await
            .unwrap();
        let client = http_client();

        let resp = client
            .get(stack.photos_url().unwrap())
            .header("Origin", "http://localhost:3000")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let records: Vec<PhotoRecord> = resp.json().await.unwrap();

        let names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, ["b.png", "a.jpg"]);

        let photo = client.get(&records[1].url).send().await.unwrap();
        assert_eq!(photo.status(), StatusCode::OK);
        assert_eq!(photo.headers()[CONTENT_TYPE], "image/jpeg");
        assert_eq!(photo.bytes().await.unwrap().as_ref(), b"jpeg-a");

        let photo = client.get(&records[0].url).send().await.unwrap();
        assert_eq!(photo.bytes().await.unwrap().as_ref(), b"png-b");

        stack.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_should_fetch_keys_with_literal_percent() {
        let stack = TestStack::spawn(&[
            ("a%41.jpg", b"literal"),
            ("aA.jpg", b"other"),
            ("my%20photo.jpg", b"spaced"),
        ])
        .await
        .unwrap();
        let client = http_client();
        let records: Vec<PhotoRecord> = client
            .get(stack.photos_url().unwrap())
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(records.len(), 3);

        for (filename, expected) in [
            ("a%41.jpg", &b"literal"[..]),
            ("aA.jpg", &b"other"[..]),
            ("my%20photo.jpg", &b"spaced"[..]),
        ] {
            let record = records.iter().find(|r| r.filename == filename).unwrap();
            let resp = client.get(&record.url).send().await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{filename}");
            assert_eq!(resp.bytes().await.unwrap().as_ref(), expected, "{filename}");
        }
    }

    #[tokio::test]
    async fn test_should_list_empty_bucket_as_empty_array() {
        let stack = TestStack::spawn(&[]).await.unwrap();

        let resp = http_client()
            .get(stack.photos_url().unwrap())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_should_answer_preflight_for_get_only() {
        let stack = TestStack::spawn(&[("a.jpg", b"a")]).await.unwrap();
        let client = http_client();
        let url = stack.photos_url().unwrap();

        let resp = client
            .request(reqwest::Method::OPTIONS, &url)
            .header("Origin", "http://localhost:3000")
            .header("Access-Control-Request-Method", "GET")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(resp.headers()["access-control-allow-methods"], "GET");

        let resp = client
            .request(reqwest::Method::OPTIONS, &url)
            .header("Origin", "http://localhost:3000")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .unwrap();
        assert!(resp.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_should_reject_unrouted_method_and_path() {
        let stack = TestStack::spawn(&[("a.jpg", b"a")]).await.unwrap();
        let client = http_client();

        let resp = client
            .post(stack.photos_url().unwrap())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = client
            .get(stack.url("/api/unknown/getAllPhotos"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Not Found");
    }

    #[tokio::test]
    async fn test_should_refuse_tampered_photo_url() {
        let stack = TestStack::spawn(&[("a.jpg", b"a"), ("b.jpg", b"b")]).await.unwrap();
        let client = http_client();
        let records: Vec<PhotoRecord> = client
            .get(stack.photos_url().unwrap())
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let signed = &records
            .iter()
            .find(|r| r.filename == "a.jpg")
            .unwrap()
            .url;

        let resp = client
            .get(signed.replace("a.jpg", "b.jpg"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let unsigned = signed.split('?').next().unwrap();
        let resp = client.get(unsigned).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_should_report_health() {
        let stack = TestStack::spawn(&[]).await.unwrap();
        let body: serde_json::Value = http_client()
            .get(stack.url("/_health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "running");
    }
}
