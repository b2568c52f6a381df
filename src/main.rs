//! Zentinel CAS command line client.
//!
//! Prints login redirect URLs and validates service tickets against a CAS
//! server, using the same client the proxy integration uses.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use http::{Request, Response, StatusCode};
use std::path::PathBuf;
use tracing::{debug, info};
use url::Url;

use zentinel_cas::response::json;
use zentinel_cas::{
    CasClient, ClientConfig, ClientConfigJson, ProtocolVersion, RedirectOptions, TicketCallback,
    ValidateOptions,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "zentinel-cas")]
#[command(about = "CAS client: login redirects and service ticket validation")]
struct Args {
    /// CAS server base URL (e.g. https://cas.example.org/cas)
    #[arg(long, env = "CAS_SERVER_URL")]
    server_url: Option<String>,

    /// CAS protocol version (1, 2 or 3)
    #[arg(long, env = "CAS_PROTOCOL_VERSION")]
    protocol: Option<u8>,

    /// JSON configuration file; command line flags take precedence
    #[arg(long, env = "CAS_CONFIG")]
    config: Option<PathBuf>,

    /// Validation request timeout in seconds
    #[arg(long, env = "CAS_REQUEST_TIMEOUT")]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, env = "CAS_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the CAS login URL for a service
    LoginUrl {
        /// Absolute service URL, or a path resolved against --origin
        #[arg(long)]
        service: Option<String>,

        /// External origin of the application (e.g. https://app.example.org)
        #[arg(long)]
        origin: Option<String>,

        /// Force primary credentials
        #[arg(long)]
        renew: bool,

        /// Never prompt for credentials
        #[arg(long)]
        gateway: bool,

        /// Response method (GET, POST, HEAD, HEADER)
        #[arg(long)]
        method: Option<String>,
    },

    /// Validate a service ticket and print the CAS server's answer
    Validate {
        /// Service URL the ticket was issued for
        #[arg(long)]
        service: String,

        /// Service ticket (ST-...)
        #[arg(long)]
        ticket: String,

        /// Only accept tickets issued from primary credentials
        #[arg(long)]
        renew: bool,

        /// Proxy callback URL
        #[arg(long)]
        pgt_url: Option<String>,

        /// Response format (XML or JSON)
        #[arg(long)]
        format: Option<String>,
    },
}

/// Merge the JSON file and command line flags into a validated config.
fn load_config(args: &Args) -> Result<(ClientConfig, ClientConfigJson)> {
    let json = match &args.config {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            serde_json::from_str::<ClientConfigJson>(&data)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        }
        None => ClientConfigJson::default(),
    };

    let mut config = ClientConfig::default();
    json.apply_to(&mut config);

    if let Some(version) = args.protocol {
        config.version = Some(ProtocolVersion::try_from(version)?);
    }
    if let Some(ref server_url) = args.server_url {
        config.server_url = server_url.clone();
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout_secs = timeout;
    }

    config.validate().context("Invalid CAS client configuration")?;
    Ok((config, json))
}

fn text_response(status: StatusCode, body: String) -> Response<String> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
}

fn verdict_status(valid: bool) -> StatusCode {
    if valid {
        StatusCode::OK
    } else {
        StatusCode::FORBIDDEN
    }
}

/// Callback rendering the validation outcome as JSON.
fn printing_callback(version: ProtocolVersion) -> TicketCallback {
    match version {
        ProtocolVersion::V1 => TicketCallback::v1(|valid, user| {
            let body = serde_json::json!({ "valid": valid, "user": user }).to_string();
            text_response(verdict_status(valid), body)
        }),
        ProtocolVersion::V2 => {
            TicketCallback::v2(|resp| text_response(verdict_status(resp.is_success()), json::encode(&resp)))
        }
        ProtocolVersion::V3 => {
            TicketCallback::v3(|resp| text_response(verdict_status(resp.is_success()), json::encode(&resp)))
        }
    }
}

fn login_url(client: &CasClient, options: RedirectOptions, origin: Option<&str>) -> Result<Url> {
    let redirector = client.login_redirector(options)?;

    let req = Request::builder()
        .uri(origin.unwrap_or("/"))
        .body(())
        .context("Invalid --origin")?;

    redirector
        .login_url(&req)
        .ok_or_else(|| anyhow!("Service is a path; pass --origin to resolve it"))
}

async fn validate(
    client: &CasClient,
    options: ValidateOptions,
    service: &str,
    ticket: &str,
) -> Result<Response<String>> {
    let validator = client.ticket_validator(options)?;

    // Replay the visitor's return from the CAS server
    let mut returned = Url::parse(service).context("Service must be an absolute URL")?;
    returned.query_pairs_mut().append_pair("ticket", ticket);
    let req = Request::builder()
        .uri(returned.as_str())
        .body(())
        .context("Service URL is not a valid request URI")?;

    debug!(service = %service, "Replaying ticket validation");
    Ok(validator.handle(&req).await)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("{}={}", env!("CARGO_CRATE_NAME"), log_level))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let (config, json) = load_config(&args)?;
    let version = config
        .version
        .context("CAS protocol version is required")?;

    info!(
        version = %version,
        server = %config.server_url,
        timeout_secs = config.request_timeout_secs,
        "Configuration loaded"
    );

    let client = CasClient::new(&config, printing_callback(version))?;

    match args.command {
        Command::LoginUrl {
            service,
            origin,
            renew,
            gateway,
            method,
        } => {
            let mut options = json.login.unwrap_or_default();
            if let Some(service) = service {
                options.service = service;
            }
            options.renew |= renew;
            options.gateway |= gateway;
            if method.is_some() {
                options.method = method;
            }

            let url = login_url(&client, options, origin.as_deref())?;
            println!("{}", url);
        }
        Command::Validate {
            service,
            ticket,
            renew,
            pgt_url,
            format,
        } => {
            let mut options = json.validate.unwrap_or_default();
            options.renew |= renew;
            if pgt_url.is_some() {
                options.pgt_url = pgt_url;
            }
            if format.is_some() {
                options.format = format;
            }

            let response = validate(&client, options, &service, &ticket).await?;
            if !response.body().is_empty() {
                println!("{}", response.body());
            }
            if response.status() != StatusCode::OK {
                return Err(anyhow!("Ticket validation ended with status {}", response.status()));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zentinel_cas::transport::Transport;
    use zentinel_cas::{AuthenticationFailure, ServiceResponse, TransportError};

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["zentinel-cas"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_load_config_from_flags() {
        let args = args(&[
            "--server-url",
            "https://cas.example.org/cas",
            "--protocol",
            "2",
            "login-url",
            "--service",
            "https://app.example.org/",
        ]);
        let (config, _) = load_config(&args).unwrap();
        assert_eq!(config.version, Some(ProtocolVersion::V2));
        assert_eq!(config.server_url, "https://cas.example.org/cas");
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_load_config_rejects_bad_version() {
        let args = args(&[
            "--server-url",
            "https://cas.example.org/cas",
            "--protocol",
            "4",
            "login-url",
        ]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn test_login_url_command() {
        let config = ClientConfig::new(ProtocolVersion::V3, "https://cas.example.org/cas");
        let client = CasClient::new(&config, printing_callback(ProtocolVersion::V3)).unwrap();
        let options = RedirectOptions {
            service: "/home".to_string(),
            ..Default::default()
        };

        let url = login_url(&client, options.clone(), Some("https://app.example.org")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://cas.example.org/cas/login?service=https%3A%2F%2Fapp.example.org%2Fhome"
        );
        assert!(login_url(&client, options, None).is_err());
    }

    struct FixedTransport(String);

    #[async_trait::async_trait]
    impl Transport for FixedTransport {
        async fn get(&self, _url: &Url) -> Result<Vec<u8>, TransportError> {
            Ok(self.0.clone().into_bytes())
        }
    }

    #[tokio::test]
    async fn test_printing_callback_renders_json() {
        let failure = ServiceResponse::Failure(AuthenticationFailure {
            code: "INVALID_TICKET".into(),
            message: "unknown".into(),
        });
        let config = ClientConfig::new(ProtocolVersion::V3, "https://cas.example.org/cas");
        let client = CasClient::with_transport(
            &config,
            printing_callback(ProtocolVersion::V3),
            FixedTransport(zentinel_cas::response::xml::encode(&failure)),
        )
        .unwrap();
        let validator = client.ticket_validator(ValidateOptions::default()).unwrap();

        let req = Request::builder()
            .uri("https://app.example.org/?ticket=ST-0123456789abcdef")
            .body(())
            .unwrap();
        let response = validator.handle(&req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json::decode(response.body().as_bytes()).unwrap(), failure);
    }
}
