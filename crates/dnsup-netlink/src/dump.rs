// # rtnetlink Dumps
//
// One request per fresh socket: send an NLM_F_DUMP request, collect every
// message until NLMSG_DONE.

use netlink_packet_core::{
    NLM_F_DUMP, NLM_F_REQUEST, NLMSG_DONE, NetlinkBuffer, NetlinkHeader, NetlinkMessage,
    NetlinkPayload,
};
use netlink_packet_route::{AddressMessage, LinkMessage, RouteMessage, RtnlMessage};
use netlink_sys::{AsyncSocket, AsyncSocketExt, SocketAddr, TokioSocket, protocols::NETLINK_ROUTE};
use std::io;

/// Routes of one address family
pub async fn routes(family: u8) -> io::Result<Vec<RouteMessage>> {
    let mut request = RouteMessage::default();
    request.header.address_family = family;

    let messages = dump(RtnlMessage::GetRoute(request)).await?;
    Ok(messages
        .into_iter()
        .filter_map(|msg| match msg {
            RtnlMessage::NewRoute(route) => Some(route),
            _ => None,
        })
        .collect())
}

/// All links
pub async fn links() -> io::Result<Vec<LinkMessage>> {
    let messages = dump(RtnlMessage::GetLink(LinkMessage::default())).await?;
    Ok(messages
        .into_iter()
        .filter_map(|msg| match msg {
            RtnlMessage::NewLink(link) => Some(link),
            _ => None,
        })
        .collect())
}

/// Addresses of one address family, on every link
pub async fn addresses(family: u8) -> io::Result<Vec<AddressMessage>> {
    let mut request = AddressMessage::default();
    request.header.family = family;

    let messages = dump(RtnlMessage::GetAddress(request)).await?;
    Ok(messages
        .into_iter()
        .filter_map(|msg| match msg {
            RtnlMessage::NewAddress(addr) => Some(addr),
            _ => None,
        })
        .collect())
}

async fn dump(request: RtnlMessage) -> io::Result<Vec<RtnlMessage>> {
    let mut socket = TokioSocket::new(NETLINK_ROUTE)?;
    socket.socket_mut().bind_auto()?;

    let buf = encode_request(request);
    socket.send_to(&buf, &SocketAddr::new(0, 0)).await?;

    let mut messages = Vec::new();
    loop {
        let (datagram, _) = socket.recv_from_full().await?;
        if decode_datagram(&datagram, &mut messages)? {
            return Ok(messages);
        }
    }
}

fn encode_request(request: RtnlMessage) -> Vec<u8> {
    let mut header = NetlinkHeader::default();
    header.flags = NLM_F_REQUEST | NLM_F_DUMP;
    header.sequence_number = 1;

    let mut packet = NetlinkMessage::new(header, NetlinkPayload::InnerMessage(request));
    packet.finalize();

    let mut buf = vec![0; packet.buffer_len()];
    packet.serialize(&mut buf[..]);
    buf
}

/// Append the messages of one datagram to `out`
///
/// Returns true once NLMSG_DONE is seen.
fn decode_datagram(datagram: &[u8], out: &mut Vec<RtnlMessage>) -> io::Result<bool> {
    let mut offset = 0;
    while offset < datagram.len() {
        let chunk = &datagram[offset..];
        let buffer = NetlinkBuffer::new_checked(chunk).map_err(invalid_data)?;
        let length = buffer.length() as usize;

        if buffer.message_type() == NLMSG_DONE {
            return Ok(true);
        }

        let message = NetlinkMessage::<RtnlMessage>::deserialize(chunk).map_err(invalid_data)?;
        match message.payload {
            NetlinkPayload::InnerMessage(inner) => out.push(inner),
            NetlinkPayload::Error(e) => {
                return Err(io::Error::other(format!("netlink error: {:?}", e)));
            }
            _ => {}
        }

        if length == 0 {
            break;
        }
        // NLMSG_ALIGN
        offset += (length + 3) & !3;
    }

    Ok(false)
}

fn invalid_data(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use netlink_packet_route::nlas::link::Nla as LinkNla;

    fn new_link(index: u32, name: &str) -> Vec<u8> {
        let mut link = LinkMessage::default();
        link.header.index = index;
        link.nlas.push(LinkNla::IfName(name.to_string()));

        let mut packet =
            NetlinkMessage::new(NetlinkHeader::default(), NetlinkPayload::InnerMessage(RtnlMessage::NewLink(link)));
        packet.finalize();
        let mut buf = vec![0; packet.buffer_len()];
        packet.serialize(&mut buf[..]);
        buf
    }

    fn done() -> Vec<u8> {
        // nlmsghdr (16 bytes) followed by a zero error code
        let mut buf = Vec::with_capacity(20);
        buf.extend_from_slice(&20u32.to_ne_bytes());
        buf.extend_from_slice(&NLMSG_DONE.to_ne_bytes());
        buf.extend_from_slice(&NLM_F_DUMP.to_ne_bytes());
        buf.extend_from_slice(&1u32.to_ne_bytes());
        buf.extend_from_slice(&0u32.to_ne_bytes());
        buf.extend_from_slice(&0i32.to_ne_bytes());
        buf
    }

    #[test]
    fn request_is_a_dump() {
        let buf = encode_request(RtnlMessage::GetLink(LinkMessage::default()));
        let buffer = NetlinkBuffer::new_checked(&buf[..]).unwrap();

        assert_eq!(buffer.length() as usize, buf.len());
        assert_eq!(buffer.flags(), NLM_F_REQUEST | NLM_F_DUMP);
    }

    #[test]
    fn datagram_with_several_messages() {
        let mut datagram = new_link(1, "lo");
        datagram.extend(new_link(2, "eth0"));

        let mut out = Vec::new();
        assert!(!decode_datagram(&datagram, &mut out).unwrap());
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[1], RtnlMessage::NewLink(link) if link.header.index == 2));
    }

    #[test]
    fn done_ends_the_dump() {
        let mut datagram = new_link(1, "lo");
        datagram.extend(done());

        let mut out = Vec::new();
        assert!(decode_datagram(&datagram, &mut out).unwrap());
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn truncated_datagram_is_an_error() {
        let datagram = new_link(1, "lo");
        let mut out = Vec::new();
        assert!(decode_datagram(&datagram[..10], &mut out).is_err());
    }
}
