//! Proxy management.

use serde_json::json;

use phonecloud_core::prelude::*;

use super::catalog;
use super::params::{require_non_empty, ProxySettings};
use super::DeviceActions;
use crate::correlator::ActionHandle;

impl DeviceActions {
    pub fn current_proxy(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::CURRENT_PROXY)
    }

    /// Route device traffic through `proxy`.
    pub fn connect_proxy(&self, proxy: &ProxySettings) -> Result<ActionHandle> {
        let spec = catalog::CONNECT_PROXY;
        require_non_empty(spec.id, "host", &proxy.host)?;
        if proxy.port == 0 {
            return Err(Error::invalid_argument(spec.id, "port must be non-zero"));
        }
        self.send(
            spec,
            json!({
                "type": proxy.kind,
                "host": proxy.host,
                "port": proxy.port,
                "username": proxy.username,
                "password": proxy.password,
            }),
        )
    }

    pub fn check_proxy_connected(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::CHECK_PROXY_CONNECTED)
    }

    pub fn check_proxy_has_internet(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::CHECK_PROXY_HAS_INTERNET)
    }

    /// Public IP information as seen through the proxy.
    pub fn get_proxy_ip_info(&self) -> Result<ActionHandle> {
        self.send_empty(catalog::GET_PROXY_IP_INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::super::params::ProxyKind;
    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_connect_proxy_payload() {
        let (actions, mut outbound) = subscribed_actions();
        let proxy =
            ProxySettings::new(ProxyKind::Socks5, "192.168.1.123", 8080).with_auth("user", "pass");
        actions.connect_proxy(&proxy).unwrap();

        assert_eq!(
            next_payload(&mut outbound)["args"],
            json!({
                "type": "socks5",
                "host": "192.168.1.123",
                "port": 8080,
                "username": "user",
                "password": "pass"
            })
        );
    }

    #[tokio::test]
    async fn test_connect_proxy_validation() {
        let (actions, mut outbound) = subscribed_actions();
        assert!(actions
            .connect_proxy(&ProxySettings::new(ProxyKind::Http, "proxy.local", 0))
            .is_err());
        assert!(actions
            .connect_proxy(&ProxySettings::new(ProxyKind::Http, "", 3128))
            .is_err());
        assert!(outbound.try_recv().is_err());
    }
}
