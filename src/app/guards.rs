use actix_web::{dev::RequestHead, guard::Guard};
use log::warn;

// Routing guard for the operational endpoints. A request
// from a peer that isn't on the list just doesn't match
// the route, which ends up as the regular not-found
// response.
#[derive(Clone)]
pub struct LocalRequestGuard {
  allowed_ip_addresses: &'static [&'static str]
}

impl LocalRequestGuard {
  pub fn new(allowed_ips: &'static [&'static str]) -> Self {
    Self {
      allowed_ip_addresses: allowed_ips
    }
  }
}

impl Guard for LocalRequestGuard {
  fn check(&self, req: &RequestHead) -> bool {
    match req.peer_addr {
      Some(sock_addr) => {
        let addr = sock_addr.ip().to_string();
        if self.allowed_ip_addresses.iter().any(|i| *i == addr) {
          true
        } else {
          warn!("IP address {} attempted to reach protected \
            endpoint at {}", addr, req.uri);
          false
        }
      },
      None => false
    }
  }
}
