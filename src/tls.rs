use crate::client::handle_client;
use crate::messages::CoordinatorMessage;
use anyhow::{Context, ensure};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::{self, crypto::CryptoProvider};
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tracing::warn;

fn provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Builds the acceptor from a PEM certificate chain and private key.
pub fn load_acceptor(cert_path: &Path, key_path: &Path) -> anyhow::Result<TlsAcceptor> {
    let cert_pem = std::fs::read(cert_path)
        .with_context(|| format!("reading certificate {}", cert_path.display()))?;
    let key_pem = std::fs::read(key_path)
        .with_context(|| format!("reading private key {}", key_path.display()))?;
    acceptor_from_pem(&cert_pem, &key_pem)
}

pub fn acceptor_from_pem(cert_pem: &[u8], key_pem: &[u8]) -> anyhow::Result<TlsAcceptor> {
    let certs = parse_certs(cert_pem)?;
    let key = parse_key(key_pem)?;
    let config = rustls::ServerConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("certificate and key do not form a usable pair")?;
    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn parse_certs(mut pem: &[u8]) -> anyhow::Result<Vec<CertificateDer<'static>>> {
    let certs = rustls_pemfile::certs(&mut pem)
        .collect::<Result<Vec<_>, _>>()
        .context("malformed certificate PEM")?;
    ensure!(!certs.is_empty(), "no certificate found in PEM");
    Ok(certs)
}

fn parse_key(mut pem: &[u8]) -> anyhow::Result<PrivateKeyDer<'static>> {
    rustls_pemfile::private_key(&mut pem)
        .context("malformed private key PEM")?
        .context("no private key found in PEM")
}

/// Runs the handshake, then hands the encrypted stream to the connection
/// worker. A failed handshake only drops this connection.
pub async fn serve_tls_client<S>(
    acceptor: TlsAcceptor,
    stream: S,
    addr: SocketAddr,
    coordinator_tx: mpsc::UnboundedSender<CoordinatorMessage>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    match acceptor.accept(stream).await {
        Ok(tls_stream) => {
            let (reader, writer) = tokio::io::split(tls_stream);
            handle_client(reader, writer, addr, coordinator_tx).await;
        }
        Err(e) => warn!("TLS handshake with {} failed: {}", addr, e),
    }
}
