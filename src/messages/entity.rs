use crate::prelude::*;

use super::{Message, MessageBuf, MessageType, TypedMessage};

message! {
    EntityCreate(
        entity_id: u64,
        entity_name: String,
        entity_class: String,
        mesh_type: String,
        mesh_subtype: String,
        area: String,
        position: Vec3,
        rot: f32
    ): b"EnCr"
    EntityMove(
        entity_id: u64,
        area: String,
        position: Vec3,
        direction: Vec3,
        direction_speed: f32,
        rot: f32,
        rot_speed: f32,
        mov_fwd: bool,
        mov_bwd: bool,
        run: bool,
        rot_left: bool,
        rot_right: bool
    ): b"EnMv"
    EntityDestroy(entity_id: u64): b"EnDt"
    /// The player's own sheet. Only the base abilities travel.
    PlayerData(
        health_max: i16,
        health_cur: i16,
        magic_max: i16,
        magic_cur: i16,
        load_max: i16,
        load_cur: i16,
        stamina: i16,
        gold: i32,
        level: i32,
        ab_con: i16,
        ab_str: i16,
        ab_dex: i16,
        ab_int: i16,
        ab_wis: i16,
        ab_cha: i16
    ): b"PlDa"
    /// Minutes since the game calendar started.
    TimeMinute(gametime: u32): b"TmMn"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::message::{decode, serialize, HEADER_SIZE};

    #[test]
    fn entity_create_ends_with_position_and_rotation() {
        let msg = EntityCreate {
            entity_id: 1,
            entity_name: "Ayla".into(),
            entity_class: "player".into(),
            mesh_type: "human".into(),
            mesh_subtype: "f".into(),
            area: "port".into(),
            position: Vec3::new(0.0, 2.0, 0.0),
            rot: 1.5,
        };
        let frame = serialize(&msg).unwrap();
        let payload = frame.payload();
        assert_eq!(&payload[..8], &[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(&payload[8..13], b"Ayla ");
        assert_eq!(&payload[payload.len() - 4..], &1.5f32.to_be_bytes());
        assert_eq!(decode::<EntityCreate>(frame.as_bytes()).unwrap().0, msg);
    }

    #[test]
    fn player_data_signed_fields() {
        let msg = PlayerData { health_max: 30, health_cur: -4, gold: -1, level: 3, ab_cha: 12, ..PlayerData::default() };
        let frame = serialize(&msg).unwrap();
        let payload = frame.payload();
        assert_eq!(payload.len(), 7 * 2 + 2 * 4 + 6 * 2);
        assert_eq!(&payload[2..4], &[0xFF, 0xFC]);
        assert_eq!(&payload[14..18], &[0xFF; 4]);
        assert_eq!(&payload[payload.len() - 2..], &[0, 12]);
        assert_eq!(decode::<PlayerData>(frame.as_bytes()).unwrap().0, msg);
    }

    #[test]
    fn entity_move_size_and_flags() {
        let msg = EntityMove {
            entity_id: 42,
            area: "port".into(),
            position: Vec3::new(1.0, 0.0, -3.5),
            direction: Vec3::new(0.0, 1.0, 0.0),
            direction_speed: 2.5,
            rot: 0.5,
            rot_speed: 0.1,
            mov_fwd: true,
            run: true,
            ..EntityMove::default()
        };
        let frame = serialize(&msg).unwrap();
        assert_eq!(frame.len(), HEADER_SIZE + 8 + 5 + 24 + 12 + 5);
        assert_eq!(&frame.as_bytes()[frame.len() - 5..], &[1, 0, 1, 0, 0]);
        let (back, status) = decode::<EntityMove>(frame.as_bytes()).unwrap();
        assert!(status.is_clean());
        assert_eq!(back, msg);
    }
}
