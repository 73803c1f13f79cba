use std::{sync::Arc, time::Duration};

use assert_approx_eq::assert_approx_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use teleop_core::{
    BaseVelocity, Direction, InputEvent, MoveBase, PublisherConfig, TeleopHandle, VelocityLimits,
    VelocityPublisher,
};
use teleop_rosbridge::{
    msg::{RosMessage, Twist, Vector3},
    ConnectionState, Error, RosbridgeClient, RosbridgeCmdVelMoveBase,
};
use tokio::{net::TcpListener, time};
use tokio_tungstenite::tungstenite::Message;

mod util;
use util::{next_json, spawn_dropping_server, spawn_server, wait_closed, Received, TIMEOUT};

/// `std_msgs/String`
#[derive(Debug, Serialize, Deserialize)]
struct StringMsg {
    data: String,
}

impl RosMessage for StringMsg {
    const TYPE_NAME: &'static str = "std_msgs/String";
}

#[tokio::test]
async fn test_advertise_publish_unadvertise() {
    let (url, mut rx) = spawn_server(vec![]).await;
    let client = RosbridgeClient::connect(&url, TIMEOUT).await.unwrap();
    assert_eq!(client.state(), ConnectionState::Connected);

    let publisher = client.advertise::<Twist>("/cmd_vel").unwrap();
    assert_eq!(
        next_json(&mut rx).await,
        json!({"op": "advertise", "topic": "/cmd_vel", "type": "geometry_msgs/Twist"})
    );

    let twist = Twist {
        linear: Vector3 {
            x: 0.25,
            ..Default::default()
        },
        angular: Vector3 {
            z: -0.5,
            ..Default::default()
        },
    };
    publisher.publish(&twist).unwrap();
    let published = next_json(&mut rx).await;
    assert_eq!(published["op"], "publish");
    assert_eq!(published["topic"], "/cmd_vel");
    assert_approx_eq!(published["msg"]["linear"]["x"].as_f64().unwrap(), 0.25);
    assert_approx_eq!(published["msg"]["angular"]["z"].as_f64().unwrap(), -0.5);

    drop(publisher);
    assert_eq!(
        next_json(&mut rx).await,
        json!({"op": "unadvertise", "topic": "/cmd_vel"})
    );
}

#[tokio::test]
async fn test_shared_advertisement() {
    let (url, mut rx) = spawn_server(vec![]).await;
    let client = RosbridgeClient::connect(&url, TIMEOUT).await.unwrap();

    let first = client.advertise::<Twist>("/cmd_vel").unwrap();
    let second = client.advertise::<Twist>("/cmd_vel").unwrap();
    assert_eq!(next_json(&mut rx).await["op"], "advertise");

    drop(first);
    second.publish(&Twist::default()).unwrap();
    // still advertised: the next operation is the publish
    assert_eq!(next_json(&mut rx).await["op"], "publish");

    drop(second);
    assert_eq!(next_json(&mut rx).await["op"], "unadvertise");
}

#[tokio::test]
async fn test_advertise_type_mismatch() {
    let (url, mut rx) = spawn_server(vec![]).await;
    let client = RosbridgeClient::connect(&url, TIMEOUT).await.unwrap();

    let twist = client.advertise::<Twist>("/cmd_vel").unwrap();
    assert_eq!(next_json(&mut rx).await["op"], "advertise");
    let err = client.advertise::<StringMsg>("/cmd_vel").unwrap_err();
    assert!(
        matches!(
            &err,
            Error::TypeMismatch { topic, advertised, requested }
                if topic == "/cmd_vel"
                    && advertised == "geometry_msgs/Twist"
                    && requested == "std_msgs/String"
        ),
        "{err}"
    );

    // the failed request does not hold a reference to the topic
    drop(twist);
    assert_eq!(next_json(&mut rx).await["op"], "unadvertise");

    // once unadvertised, the topic can take another type
    let _string = client.advertise::<StringMsg>("/cmd_vel").unwrap();
    assert_eq!(
        next_json(&mut rx).await,
        json!({"op": "advertise", "topic": "/cmd_vel", "type": "std_msgs/String"})
    );
}

#[tokio::test]
async fn test_invalid_topic() {
    let (url, _rx) = spawn_server(vec![]).await;
    let client = RosbridgeClient::connect(&url, TIMEOUT).await.unwrap();
    assert!(matches!(
        client.advertise::<Twist>(""),
        Err(Error::InvalidTopic(_))
    ));
    assert!(matches!(
        client.advertise::<Twist>("/cmd vel"),
        Err(Error::InvalidTopic(_))
    ));
}

#[tokio::test]
async fn test_invalid_url() {
    assert!(matches!(
        RosbridgeClient::connect("not a url", TIMEOUT).await,
        Err(Error::InvalidUrl(..))
    ));
    assert!(matches!(
        RosbridgeClient::connect("http://localhost:9090", TIMEOUT).await,
        Err(Error::UnsupportedScheme(scheme)) if scheme == "http"
    ));
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    assert!(matches!(
        RosbridgeClient::connect(&format!("ws://{addr}"), TIMEOUT).await,
        Err(Error::WebSocket(_))
    ));
}

#[tokio::test]
async fn test_connect_timeout() {
    // accepts TCP but never answers the WebSocket handshake
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let timeout = Duration::from_millis(200);
    assert!(matches!(
        RosbridgeClient::connect(&format!("ws://{addr}"), timeout).await,
        Err(Error::Timeout(t)) if t == timeout
    ));
    drop(listener);
}

#[tokio::test]
async fn test_remote_close() {
    let status = json!({"op": "status", "level": "warning", "msg": "shutting down"});
    let (url, mut rx) = spawn_server(vec![
        Message::Text(status.to_string()),
        Message::Close(None),
    ])
    .await;
    let client = RosbridgeClient::connect(&url, TIMEOUT).await.unwrap();
    wait_closed(&mut rx).await;

    let mut state = client.state_receiver();
    time::timeout(TIMEOUT, state.wait_for(|s| !s.is_connected()))
        .await
        .unwrap()
        .unwrap();
    assert!(!client.is_connected());
    assert!(matches!(
        client.advertise::<Twist>("/cmd_vel"),
        Err(Error::NotConnected)
    ));
}

#[tokio::test]
async fn test_connection_dropped_without_close_frame() {
    let (url, mut rx) = spawn_dropping_server().await;
    let client = RosbridgeClient::connect(&url, TIMEOUT).await.unwrap();
    let _publisher = client.advertise::<Twist>("/cmd_vel").unwrap();
    assert_eq!(next_json(&mut rx).await["op"], "advertise");
    wait_closed(&mut rx).await;

    let mut state = client.state_receiver();
    let state = time::timeout(TIMEOUT, state.wait_for(|s| !s.is_connected()))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert!(matches!(state, ConnectionState::Failed(_)), "{state}");
    assert!(matches!(
        client.advertise::<Twist>("/other"),
        Err(Error::NotConnected)
    ));
}

#[tokio::test]
async fn test_final_zero_before_close() {
    let (url, mut rx) = spawn_server(vec![]).await;
    let client = RosbridgeClient::connect(&url, TIMEOUT).await.unwrap();
    let move_base = RosbridgeCmdVelMoveBase::new(&client, "/cmd_vel").unwrap();
    assert_eq!(next_json(&mut rx).await["op"], "advertise");

    let handle = TeleopHandle::new(VelocityLimits::new(0.5, 1.0).unwrap());
    handle.apply(InputEvent::DirectionPressed(Direction::Forward));
    let publisher = Arc::new(VelocityPublisher::new(
        move_base,
        handle,
        PublisherConfig {
            period: Duration::from_millis(10),
            ..Default::default()
        },
    ));
    let task = publisher.spawn();
    let first = next_json(&mut rx).await;
    assert_eq!(first["op"], "publish");
    assert_approx_eq!(first["msg"]["linear"]["x"].as_f64().unwrap(), 0.5);
    time::sleep(Duration::from_millis(50)).await;

    // same order as a disconnect: stop publishing, then close the socket
    publisher.stop();
    task.await.unwrap();
    client.close();
    drop(publisher);

    let mut last = None;
    loop {
        match time::timeout(TIMEOUT, rx.recv()).await.unwrap() {
            Some(Received::Json(v)) => last = Some(v),
            Some(Received::Closed) | None => break,
        }
    }
    let last = last.unwrap();
    assert_eq!(last["op"], "publish");
    let twist: Twist = serde_json::from_value(last["msg"].clone()).unwrap();
    assert_eq!(BaseVelocity::from(&twist), BaseVelocity::ZERO);
}

#[tokio::test]
async fn test_close() {
    let (url, mut rx) = spawn_server(vec![]).await;
    let client = RosbridgeClient::connect(&url, TIMEOUT).await.unwrap();
    let publisher = client.advertise::<Twist>("/cmd_vel").unwrap();
    assert_eq!(next_json(&mut rx).await["op"], "advertise");

    client.close();
    assert_eq!(client.state(), ConnectionState::Closed);
    wait_closed(&mut rx).await;
    assert!(matches!(
        publisher.publish(&Twist::default()),
        Err(Error::NotConnected)
    ));
}

#[tokio::test]
async fn test_cmd_vel_move_base() {
    let (url, mut rx) = spawn_server(vec![]).await;
    let client = RosbridgeClient::connect(&url, TIMEOUT).await.unwrap();
    let move_base = RosbridgeCmdVelMoveBase::new(&client, "/robot/cmd_vel").unwrap();
    assert_eq!(move_base.topic(), "/robot/cmd_vel");
    assert_eq!(
        next_json(&mut rx).await,
        json!({"op": "advertise", "topic": "/robot/cmd_vel", "type": "geometry_msgs/Twist"})
    );

    for count in 0..10 {
        let vel = BaseVelocity::new(0.01 * count as f64, 0.0, -0.1 * count as f64);
        move_base.send_velocity(&vel).unwrap();
    }
    for count in 0..10 {
        let published = next_json(&mut rx).await;
        assert_eq!(published["topic"], "/robot/cmd_vel");
        let twist: Twist = serde_json::from_value(published["msg"].clone()).unwrap();
        assert_approx_eq!(twist.linear.x, 0.01 * count as f64);
        assert_approx_eq!(twist.angular.z, -0.1 * count as f64);
        assert_approx_eq!(twist.linear.y, 0.0);
    }

    client.close();
    assert!(matches!(
        move_base.send_velocity(&BaseVelocity::default()),
        Err(teleop_core::Error::Connection { .. })
    ));
}
