// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::net::SocketAddr;

use tokio::net::TcpListener;

/// Turn an address as exchanged between the processes (`localhost:50051`) into a URI a gRPC
/// channel can connect to.
pub fn to_endpoint_uri(address: &str) -> String {
    let address = address.trim();
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

/// Strip the scheme, if any, leaving a `host:port` suitable for binding.
pub fn to_bind_address(address: &str) -> &str {
    let address = address.trim();
    address
        .strip_prefix("http://")
        .or_else(|| address.strip_prefix("https://"))
        .unwrap_or(address)
}

/// Ask the OS for a free TCP port on `host` by binding to port 0 and releasing it again.
///
/// Used when the address has to be handed to another process before that process binds it. When
/// the server runs in this process, bind a listener directly instead.
pub async fn free_local_address(host: &str) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind((host, 0)).await?;
    listener.local_addr()
}
