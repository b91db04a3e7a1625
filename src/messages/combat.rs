//! Battles between entities.

use super::{Message, MessageBuf, MessageType, TypedMessage};

codes! {
    BattleState { Start = 1, Accepted = 2, End = 3 }
    /// Normal battles are accepted on the spot; duels have to be agreed to.
    BattleType { Normal = 1, Duel = 2 }
    BattleAction { Attack = 1, Defend = 2, NonCombat = 3 }
    SpecialAction { Spell = 1, Special = 2 }
    BattleResult { Hit = 1, Miss = 2, Other = 3 }
}

message! {
    Combat(target: u64, kind: u32, state: u32): b"Cmbt"
    /// `special` names the spell or special attack, if any.
    CombatAction(target: String, action: u32, special_kind: u32, special: String): b"CmAc"
    /// Goes to both sides of the fight.
    CombatResult(target: u64, damage: u32, result: u32): b"CmRs"
}

impl Combat {
    pub fn state(&self) -> Option<BattleState> {
        BattleState::from_code(self.state)
    }
    pub fn battle_type(&self) -> Option<BattleType> {
        BattleType::from_code(self.kind)
    }
}

impl CombatAction {
    pub fn action(&self) -> Option<BattleAction> {
        BattleAction::from_code(self.action)
    }
    pub fn special_action(&self) -> Option<SpecialAction> {
        SpecialAction::from_code(self.special_kind)
    }
}

impl CombatResult {
    pub fn outcome(&self) -> Option<BattleResult> {
        BattleResult::from_code(self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::message::{decode, serialize};

    #[test]
    fn combat_type_goes_before_state() {
        let msg = Combat { target: 2, kind: BattleType::Duel as u32, state: BattleState::Start as u32 };
        let frame = serialize(&msg).unwrap();
        assert_eq!(&frame.payload()[8..], &[0, 0, 0, 2, 0, 0, 0, 1]);
        let (back, _) = decode::<Combat>(frame.as_bytes()).unwrap();
        assert_eq!(back.battle_type(), Some(BattleType::Duel));
        assert_eq!(back.state(), Some(BattleState::Start));
    }

    #[test]
    fn action_reads_back_its_special_part() {
        let msg = CombatAction {
            target: "wolf".into(),
            action: BattleAction::Attack as u32,
            special_kind: SpecialAction::Spell as u32,
            special: "ray of frost".into(),
        };
        let frame = serialize(&msg).unwrap();
        let (back, status) = decode::<CombatAction>(frame.as_bytes()).unwrap();
        assert!(status.is_clean());
        assert_eq!(back.special_action(), Some(SpecialAction::Spell));
        assert_eq!(back, msg);
    }

    #[test]
    fn result_codes() {
        let hit = CombatResult { target: 9, damage: 14, result: BattleResult::Hit as u32 };
        assert_eq!(hit.outcome(), Some(BattleResult::Hit));
        assert_eq!(CombatResult { result: 4, ..hit }.outcome(), None);
    }
}
