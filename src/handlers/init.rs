use super::Context;
use crate::auth::Claims;
use crate::protocol::{ClientFrame, InitArgs, InitOk, ServerFrame, SignalError};

/// `INIT` (uninitialized → valid), spec.md §4.3. Re-issuing `INIT` on an
/// already-valid client is a warning, not an error -- the connection
/// stays open.
pub fn handle(ctx: &Context, frame: &ClientFrame) -> Result<(), SignalError> {
    if ctx.client.is_valid() {
        ctx.client
            .send(ServerFrame::new("WARNING", "already authorized"));
        return Ok(());
    }

    let args: InitArgs = serde_json::from_value(frame.payload.clone())
        .map_err(|e| SignalError::violation(format!("malformed INIT payload: {e}")))?;

    // If upgrade-time claims already set `authed_with_cookie`, use them;
    // otherwise validate the token carried in this payload (spec.md §4.3).
    let claims = if ctx.client.authed_with_cookie {
        Claims {
            user_id: ctx.client.user_id(),
            username: ctx.client.username(),
        }
    } else {
        ctx.auth
            .validate(&args.token)
            .map_err(|_| SignalError::unauthorized("unauthorized"))?
    };

    if !ctx.client.authorize(
        claims.user_id.clone(),
        if args.username.is_empty() {
            claims.username
        } else {
            args.username
        },
        args.public_key,
    ) {
        ctx.client
            .send(ServerFrame::new("WARNING", "already authorized"));
        return Ok(());
    }

    ctx.client.send(
        ServerFrame::new(
            "INIT_OK",
            serde_json::to_value(InitOk {
                instance_id: ctx.client.instance_id.clone(),
                user_id: ctx.client.user_id(),
                username: ctx.client.username(),
            })
            .expect("InitOk always serializes"),
        )
        .with_listener(frame.listener.clone()),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::context;

    fn init_frame(username: &str) -> ClientFrame {
        ClientFrame {
            opcode: "INIT".into(),
            payload: serde_json::json!({"token": "", "username": username}),
            listener: None,
            recipient: None,
        }
    }

    #[test]
    fn repeated_init_warns_without_erroring() {
        let ctx = context("g1", "id_g1");
        let frame = init_frame("A");
        assert!(handle(&ctx, &frame).is_ok());
        assert!(ctx.client.is_valid());
        assert!(handle(&ctx, &frame).is_ok());
    }

    #[test]
    fn successful_init_authorizes_the_client() {
        let ctx = context("g1", "id_g1");
        assert!(handle(&ctx, &init_frame("Alice")).is_ok());
        assert_eq!(ctx.client.username(), "Alice");
    }
}
