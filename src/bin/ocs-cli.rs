use clap::{Parser, Subcommand, ValueEnum};
use reqwest::{Client, RequestBuilder};

#[derive(Parser)]
#[command(name = "ocs-cli")]
#[command(about = "Command-line client for an OCS endpoint", long_about = None)]
struct Cli {
    /// Endpoint root, including the base path.
    #[arg(short, long, default_value = "http://localhost:8080/ocs/v1.php")]
    url: String,

    #[arg(short = 'U', long)]
    user: Option<String>,

    #[arg(short, long)]
    password: Option<String>,

    #[arg(short, long, value_enum, default_value_t = Format::Xml)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Xml,
    Json,
}

impl Format {
    fn as_str(self) -> &'static str {
        match self {
            Format::Xml => "xml",
            Format::Json => "json",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show server configuration
    Config,
    /// Check a login/password pair
    PersonCheck { login: String, password: String },
    /// List your activities
    Activity {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        pagesize: u32,
    },
    /// Publish an activity
    PostActivity { message: String },
    /// Read private data (all apps or keys when omitted)
    Get { app: Option<String>, key: Option<String> },
    /// Store a private data value
    Set { app: String, key: String, value: String },
    /// Delete a private data key
    Delete { app: String, key: String },
    /// Show a user's quota
    Quota { user: String },
    /// Set a user's quota in bytes
    SetQuota { user: String, quota: i64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();
    let ext = cli.format.as_str();
    let url = |path: String| format!("{}{}", cli.url.trim_end_matches('/'), path);

    let request = match &cli.command {
        Commands::Config => client.get(url(format!("/config.{ext}"))),
        Commands::PersonCheck { login, password } => client
            .post(url(format!("/person/check.{ext}")))
            .form(&[("login", login), ("password", password)]),
        Commands::Activity { page, pagesize } => client
            .get(url(format!("/activity.{ext}")))
            .query(&[("page", page), ("pagesize", pagesize)]),
        Commands::PostActivity { message } => client
            .post(url(format!("/activity.{ext}")))
            .form(&[("message", message)]),
        Commands::Get { app, key } => {
            let path = match (app, key) {
                (Some(app), Some(key)) => {
                    format!("/privatedata/getattribute/{}/{}.{ext}", segment(app), segment(key))
                }
                (Some(app), None) => format!("/privatedata/getattribute/{}", segment(app)),
                (None, _) => "/privatedata/getattribute".to_string(),
            };
            client.get(url(path)).query(&[("format", ext)])
        }
        Commands::Set { app, key, value } => client
            .post(url(format!(
                "/privatedata/setattribute/{}/{}.{ext}",
                segment(app),
                segment(key)
            )))
            .form(&[("value", value)]),
        Commands::Delete { app, key } => client.post(url(format!(
            "/privatedata/deleteattribute/{}/{}.{ext}",
            segment(app),
            segment(key)
        ))),
        Commands::Quota { user } => client.get(url(format!("/cloud/user/{}.{ext}", segment(user)))),
        Commands::SetQuota { user, quota } => client
            .post(url(format!("/cloud/user/{}.{ext}", segment(user))))
            .form(&[("quota", quota)]),
    };

    print_response(authenticate(request, &cli)).await
}

fn authenticate(request: RequestBuilder, cli: &Cli) -> RequestBuilder {
    match &cli.user {
        Some(user) => request.basic_auth(user, cli.password.as_deref()),
        None => request,
    }
}

fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

async fn print_response(request: RequestBuilder) -> Result<(), Box<dyn std::error::Error>> {
    let res = request.send().await?;
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => print!("{}", text),
    }
    Ok(())
}
