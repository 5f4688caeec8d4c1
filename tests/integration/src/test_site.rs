//! Website distribution and carousel integration tests.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use photostack_stack::topology::exports;
    use photostack_web::{Carousel, HttpPhotoFeed, SiteConfig};
    use reqwest::StatusCode;
    use reqwest::header::CONTENT_TYPE;

    use crate::{SITE_INDEX, TestStack, http_client};

    #[tokio::test]
    async fn test_should_serve_site_root_through_distribution() {
        let stack = TestStack::spawn(&[]).await.unwrap();
        let client = http_client();
        let site = stack.output(exports::WEBSITE_URL).unwrap().to_owned();

        let resp = client.get(&site).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/html");
        assert_eq!(resp.text().await.unwrap(), SITE_INDEX);

        let resp = client.get(format!("{site}index.html")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = client.get(format!("{site}missing.js")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = client.post(&site).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_should_keep_website_bucket_private() {
        let stack = TestStack::spawn(&[]).await.unwrap();
        let bucket = stack.output(exports::WEBSITE_BUCKET_NAME).unwrap();

        let resp = http_client()
            .get(stack.url(&format!("/s3/{bucket}/index.html")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_should_load_carousel_from_served_api() {
        let stack = TestStack::spawn(&[("one.jpg", b"1"), ("two.jpg", b"2")])
            .await
            .unwrap();
        let site = SiteConfig::new(stack.output(exports::API_ENDPOINT).unwrap())
            .with_interval(Duration::from_millis(500));

        let feed = HttpPhotoFeed::with_client(http_client(), site.photos_url());
        let carousel = Carousel::load(&feed, site.interval).await;

        let captions: Vec<&str> = carousel
            .slides()
            .iter()
            .map(|s| s.caption.as_str())
            .collect();
        assert_eq!(captions, ["one.jpg", "two.jpg"]);
        assert_eq!(carousel.interval(), Duration::from_millis(500));
        assert_eq!(
            carousel.slide_at(Duration::from_millis(600)).unwrap().caption,
            "two.jpg"
        );

        let first = &carousel.slides()[0].image_url;
        let resp = http_client().get(first).send().await.unwrap();
        assert_eq!(resp.bytes().await.unwrap().as_ref(), b"1");
    }

    #[tokio::test]
    async fn test_should_load_empty_carousel_after_shutdown() {
        let stack = TestStack::spawn(&[("one.jpg", b"1")]).await.unwrap();
        let url = stack.photos_url().unwrap();
        stack.shutdown().await.unwrap();

        let carousel = Carousel::load(&HttpPhotoFeed::new(url), Duration::from_secs(1)).await;
        assert!(carousel.is_empty());
    }
}
