use fetcher_http::{ClientOptions, FetchClient, FetchError, RequestOptions};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let options = ClientOptions::from_env().map_err(anyhow::Error::msg)?;
    let client = FetchClient::new(options.with_retries(2, 250))
        .with_bearer_token_provider(|| std::env::var("FETCHER_TOKEN").ok())
        .with_error_observer(|err: &FetchError| eprintln!("request failed: {err}"));

    let created = client
        .post("/posts", RequestOptions::new().json(json!({"title": "hello"})))
        .await?;
    println!("{} {:?}", created.status, created.data);

    match client
        .get("/posts", RequestOptions::new().param("userId", "1"))
        .await
    {
        Ok(posts) => println!("{:?}", posts.data),
        Err(FetchError::Http { status, message, .. }) => println!("{status}: {message}"),
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
