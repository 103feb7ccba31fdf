use russh::client::Handler;
use tracing::debug;

pub(crate) struct Client;

impl Handler for Client {
    type Error = anyhow::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        let fp = server_public_key
            .fingerprint(russh::keys::HashAlg::Sha256)
            .to_string();
        debug!("server key fingerprint: {fp}");
        Ok(true)
    }
}
